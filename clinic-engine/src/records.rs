use document_store::{collections, Aggregate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record that belongs to one patient
pub trait PatientRecord: Aggregate {
    fn patient_id(&self) -> Option<&str>;
}

fn nested_str<'a>(fields: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let (last, parents) = path.split_last()?;
    let mut current = fields;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    current.get(*last)?.as_str()
}

macro_rules! passthrough_record {
    ($(#[$meta:meta])* $name:ident, $collection:expr, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub id: String,
            /// Every other field, stored as-is
            #[serde(flatten)]
            pub fields: Map<String, Value>,
        }

        impl Aggregate for $name {
            const COLLECTION: &'static str = $collection;
            const KIND: &'static str = $kind;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

passthrough_record!(
    /// Patient demographics
    Patient,
    collections::PATIENTS,
    "Patient"
);
passthrough_record!(
    /// Calendar event; appointments carry `appointment.patientId`
    Event,
    collections::EVENTS,
    "Event"
);
passthrough_record!(Memo, collections::MEMOS, "Memo");
passthrough_record!(DoctorNote, collections::DOCTOR_NOTES, "Doctor note");

impl PatientRecord for Patient {
    fn patient_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl PatientRecord for Event {
    fn patient_id(&self) -> Option<&str> {
        nested_str(&self.fields, &["appointment", "patientId"])
    }
}

impl PatientRecord for Memo {
    fn patient_id(&self) -> Option<&str> {
        nested_str(&self.fields, &["patient", "id"])
    }
}

impl PatientRecord for DoctorNote {
    fn patient_id(&self) -> Option<&str> {
        nested_str(&self.fields, &["patient", "id"])
    }
}
