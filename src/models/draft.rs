//! The in-progress booking form held by the wizard for one session.

use serde::{Deserialize, Serialize};

use super::enums::LocationType;

/// Draft field names. Used as error-map keys and to track which fields an
/// update touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    #[serde(rename = "name")]
    ContactName,
    Phone,
    LocationType,
    Address,
    SelectedTests,
    Prescription,
    #[serde(rename = "date")]
    VisitDate,
    #[serde(rename = "timeSlot")]
    VisitTimeSlot,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContactName => "name",
            Self::Phone => "phone",
            Self::LocationType => "locationType",
            Self::Address => "address",
            Self::SelectedTests => "selectedTests",
            Self::Prescription => "prescription",
            Self::VisitDate => "date",
            Self::VisitTimeSlot => "timeSlot",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-supplied prescription file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionAttachment {
    pub filename: String,
    /// Declared media type, e.g. `image/jpeg` or `application/pdf`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

// Raw bytes stay out of logs and debug output.
impl std::fmt::Debug for PrescriptionAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrescriptionAttachment")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Booking form state. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub contact_name: String,
    pub phone: String,
    pub location_type: LocationType,
    pub address: String,
    /// Stable catalog ids in selection order. Labels are projected from the
    /// catalog only for display and for the wire payload.
    pub selected_tests: Vec<String>,
    pub prescription: Option<PrescriptionAttachment>,
    pub visit_date: String, // YYYY-MM-DD
    pub visit_time_slot: String,
}

impl BookingDraft {
    /// Merge a partial update. Returns the fields the update touched, in
    /// declaration order.
    pub fn apply(&mut self, update: DraftUpdate) -> Vec<Field> {
        let mut changed = Vec::new();

        if let Some(name) = update.contact_name {
            self.contact_name = name;
            changed.push(Field::ContactName);
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
            changed.push(Field::Phone);
        }
        if let Some(location_type) = update.location_type {
            self.location_type = location_type;
            changed.push(Field::LocationType);
        }
        if let Some(address) = update.address {
            self.address = address;
            changed.push(Field::Address);
        }
        if let Some(date) = update.visit_date {
            self.visit_date = date;
            changed.push(Field::VisitDate);
        }
        if let Some(slot) = update.visit_time_slot {
            self.visit_time_slot = slot;
            changed.push(Field::VisitTimeSlot);
        }

        changed
    }

    /// Add the test if absent, remove it if present. Returns whether the test
    /// is selected afterwards.
    pub fn toggle_test(&mut self, test_id: &str) -> bool {
        if let Some(pos) = self.selected_tests.iter().position(|id| id == test_id) {
            self.selected_tests.remove(pos);
            false
        } else {
            self.selected_tests.push(test_id.to_string());
            true
        }
    }

    pub fn is_selected(&self, test_id: &str) -> bool {
        self.selected_tests.iter().any(|id| id == test_id)
    }

    pub fn has_prescription(&self) -> bool {
        self.prescription.is_some()
    }
}

/// Partial draft update. Every `Some` field counts as changed, even when the
/// value is identical to the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftUpdate {
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub location_type: Option<LocationType>,
    pub address: Option<String>,
    pub visit_date: Option<String>,
    pub visit_time_slot: Option<String>,
}

impl DraftUpdate {
    pub fn contact_name(value: impl Into<String>) -> Self {
        Self {
            contact_name: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn phone(value: impl Into<String>) -> Self {
        Self {
            phone: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn location_type(value: LocationType) -> Self {
        Self {
            location_type: Some(value),
            ..Self::default()
        }
    }

    pub fn address(value: impl Into<String>) -> Self {
        Self {
            address: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn schedule(date: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            visit_date: Some(date.into()),
            visit_time_slot: Some(slot.into()),
            ..Self::default()
        }
    }
}
