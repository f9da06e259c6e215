use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use posy_core::{
    model::{AddressCandidate, FloristDeliveryProfile, ResolvedAddress},
    service::{DeliveryService, SearchOutcome},
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Screen {
    AddressSearch,
    FloristView,
}

pub(crate) struct App {
    pub service: Arc<DeliveryService>,
    pub florists: Vec<FloristDeliveryProfile>,

    pub screen: Screen,

    pub address_input: String,
    pub candidates: Vec<AddressCandidate>,
    pub candidate_index: usize,
    pub resolved_address: Option<ResolvedAddress>,

    pub delivery_date: NaiveDate,
    pub outcome: Option<SearchOutcome>,

    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(
        service: Arc<DeliveryService>,
        florists: Vec<FloristDeliveryProfile>,
    ) -> Self {
        Self {
            service,
            florists,
            screen: Screen::AddressSearch,
            address_input: String::new(),
            candidates: Vec::new(),
            candidate_index: 0,
            resolved_address: None,
            delivery_date: Self::today(),
            outcome: None,
            is_loading: false,
            error_message: None,
        }
    }

    pub(crate) fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) fn current_candidate(&self) -> Option<AddressCandidate> {
        self.candidates.get(self.candidate_index).cloned()
    }

    /// Move the delivery date, never before today.
    pub(crate) fn shift_date(&mut self, forward: bool) -> bool {
        let shifted = if forward {
            self.delivery_date.checked_add_days(Days::new(1))
        } else {
            self.delivery_date.checked_sub_days(Days::new(1))
        };

        match shifted {
            Some(date) if date >= Self::today() => {
                self.delivery_date = date;
                true
            }
            _ => false,
        }
    }
}
