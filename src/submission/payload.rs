use serde::{Deserialize, Serialize};

use crate::attachment::CompressionResult;
use crate::models::{BookingDraft, LocationType};

/// Flat JSON body of the booking POST.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub name: String,
    pub phone: String,
    pub location_type: LocationType,
    pub address: String,
    pub date: String,
    pub time_slot: String,
    /// Display names of the selected tests, in selection order.
    pub selected_tests: Vec<String>,
    /// Data URI of the compressed prescription.
    pub prescription_file: Option<String>,
    pub prescription_file_name: Option<String>,
}

impl BookingPayload {
    /// Snapshot the draft into a wire payload.
    ///
    /// `selected_tests` are the already-projected display labels. The
    /// prescription fields are both set only when the draft carries an
    /// attachment and its compression result is available.
    pub fn assemble(
        draft: &BookingDraft,
        selected_tests: Vec<String>,
        attachment: Option<&CompressionResult>,
    ) -> Self {
        let (prescription_file, prescription_file_name) =
            match (attachment, draft.prescription.as_ref()) {
                (Some(encoded), Some(original)) => (
                    Some(encoded.encoded_payload.clone()),
                    Some(original.filename.clone()),
                ),
                _ => (None, None),
            };

        Self {
            name: draft.contact_name.clone(),
            phone: draft.phone.clone(),
            location_type: draft.location_type,
            address: draft.address.clone(),
            date: draft.visit_date.clone(),
            time_slot: draft.visit_time_slot.clone(),
            selected_tests,
            prescription_file,
            prescription_file_name,
        }
    }
}

// Contact details and the attachment blob stay out of logs.
impl std::fmt::Debug for BookingPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingPayload")
            .field("location_type", &self.location_type)
            .field("date", &self.date)
            .field("time_slot", &self.time_slot)
            .field("selected_tests", &self.selected_tests.len())
            .field("has_prescription", &self.prescription_file.is_some())
            .finish()
    }
}
