//! Shared cross-view selection state.
//!
//! Three independent signals — selected patient, selected wavelength,
//! selected grid cell — link the four views. The [`SelectionHub`] is an
//! explicit, injectable store (tests construct their own instance) with
//! field-level change notification: a write publishes to every subscriber
//! interested in that field, and only when the value actually changed.
//! There is no debouncing here; a drag burst publishes every write, and a
//! consuming view coalesces on its side.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use serde::Serialize;

use crate::radial::GridCell;

/// Snapshot of the three selection signals. All-`None` at session start;
/// clearing a field is always an explicit `None` write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionState {
    pub patient: Option<String>,
    pub wavelength: Option<f64>,
    pub cell: Option<GridCell>,
}

/// Which selection signal a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionField {
    Patient,
    Wavelength,
    Cell,
}

/// Delivered to subscribers on every observed change. Carries the
/// post-write snapshot so a consumer never reads a stale state.
#[derive(Debug, Clone)]
pub struct SelectionChange {
    pub field: SelectionField,
    pub state: SelectionState,
}

struct Subscriber {
    fields: Vec<SelectionField>,
    tx: Sender<SelectionChange>,
}

/// The process-wide selection store. One writer at a time (the interaction
/// handler currently executing); any number of readers.
#[derive(Default)]
pub struct SelectionHub {
    state: Mutex<SelectionState>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SelectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, copied under a single lock.
    pub fn snapshot(&self) -> SelectionState {
        self.state.lock().unwrap().clone()
    }

    /// Register interest in a set of fields. The receiver sees one
    /// [`SelectionChange`] per observed write to any of them.
    pub fn subscribe(&self, fields: &[SelectionField]) -> Receiver<SelectionChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().unwrap().push(Subscriber {
            fields: fields.to_vec(),
            tx,
        });
        rx
    }

    /// Set or clear the selected patient. Never touches the other fields.
    pub fn set_selected_patient(&self, patient: Option<String>) {
        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.patient == patient {
                None
            } else {
                state.patient = patient;
                Some(state.clone())
            }
        };
        if let Some(state) = changed {
            self.publish(SelectionField::Patient, state);
        }
    }

    /// Set or clear the selected wavelength. Never touches the other fields.
    pub fn set_selected_wavelength(&self, wavelength: Option<f64>) {
        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.wavelength == wavelength {
                None
            } else {
                state.wavelength = wavelength;
                Some(state.clone())
            }
        };
        if let Some(state) = changed {
            self.publish(SelectionField::Wavelength, state);
        }
    }

    /// Set or clear the selected grid cell. Never touches the other fields.
    pub fn set_selected_cell(&self, cell: Option<GridCell>) {
        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.cell == cell {
                None
            } else {
                state.cell = cell;
                Some(state.clone())
            }
        };
        if let Some(state) = changed {
            self.publish(SelectionField::Cell, state);
        }
    }

    /// Deliver a change to every interested subscriber; subscribers whose
    /// receiver was dropped are pruned here.
    fn publish(&self, field: SelectionField, state: SelectionState) {
        let change = SelectionChange { field, state };
        self.subscribers.lock().unwrap().retain(|sub| {
            if sub.fields.contains(&field) {
                sub.tx.send(change.clone()).is_ok()
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_all_null() {
        let hub = SelectionHub::new();
        assert_eq!(hub.snapshot(), SelectionState::default());
    }

    #[test]
    fn setters_are_independent_in_any_order() {
        let hub = SelectionHub::new();
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_wavelength(Some(800.0));
        hub.set_selected_cell(Some(GridCell { line: 2, ring: 5 }));

        // Re-writing one field must not alter the other two.
        hub.set_selected_wavelength(Some(801.0));
        let s = hub.snapshot();
        assert_eq!(s.patient.as_deref(), Some("P1"));
        assert_eq!(s.wavelength, Some(801.0));
        assert_eq!(s.cell, Some(GridCell { line: 2, ring: 5 }));

        hub.set_selected_patient(None);
        let s = hub.snapshot();
        assert_eq!(s.patient, None);
        assert_eq!(s.wavelength, Some(801.0));
        assert_eq!(s.cell, Some(GridCell { line: 2, ring: 5 }));
    }

    #[test]
    fn clearing_is_explicit_only() {
        let hub = SelectionHub::new();
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_cell(Some(GridCell { line: 1, ring: 1 }));
        // Changing the patient does not implicitly clear the cell.
        hub.set_selected_patient(Some("P2".to_string()));
        assert_eq!(hub.snapshot().cell, Some(GridCell { line: 1, ring: 1 }));
    }

    #[test]
    fn subscribers_see_only_their_fields() {
        let hub = SelectionHub::new();
        let patient_rx = hub.subscribe(&[SelectionField::Patient]);
        let wavelength_rx = hub.subscribe(&[SelectionField::Wavelength]);

        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_wavelength(Some(800.0));

        let change = patient_rx.try_recv().expect("patient change");
        assert_eq!(change.field, SelectionField::Patient);
        assert!(patient_rx.try_recv().is_err(), "no wavelength delivery");

        let change = wavelength_rx.try_recv().expect("wavelength change");
        assert_eq!(change.field, SelectionField::Wavelength);
    }

    #[test]
    fn change_carries_post_write_state() {
        let hub = SelectionHub::new();
        let rx = hub.subscribe(&[SelectionField::Patient]);
        hub.set_selected_patient(Some("P1".to_string()));
        let change = rx.try_recv().expect("change");
        assert_eq!(change.state.patient.as_deref(), Some("P1"));
        // The hub snapshot agrees: write applied before publish.
        assert_eq!(hub.snapshot(), change.state);
    }

    #[test]
    fn equal_writes_do_not_publish() {
        let hub = SelectionHub::new();
        let rx = hub.subscribe(&[SelectionField::Cell]);
        hub.set_selected_cell(Some(GridCell { line: 2, ring: 5 }));
        hub.set_selected_cell(Some(GridCell { line: 2, ring: 5 }));
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "identical write must not republish");
    }

    #[test]
    fn rapid_writes_all_publish() {
        let hub = SelectionHub::new();
        let rx = hub.subscribe(&[SelectionField::Wavelength]);
        for i in 0..10 {
            hub.set_selected_wavelength(Some(800.0 + i as f64));
        }
        // No debouncing at this layer: every distinct write is observed.
        assert_eq!(rx.try_iter().count(), 10);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = SelectionHub::new();
        {
            let _rx = hub.subscribe(&[SelectionField::Patient]);
        }
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_patient(Some("P2".to_string()));
        assert_eq!(hub.subscribers.lock().unwrap().len(), 0);
    }

    #[test]
    fn multi_field_subscription_sees_each_field() {
        let hub = SelectionHub::new();
        let rx = hub.subscribe(&[SelectionField::Patient, SelectionField::Cell]);
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_wavelength(Some(800.0));
        hub.set_selected_cell(Some(GridCell { line: 1, ring: 2 }));

        let fields: Vec<SelectionField> = rx.try_iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![SelectionField::Patient, SelectionField::Cell]);
    }
}
