//! Support modules for reconciliation BDD tests.

pub(crate) mod state;

pub(crate) use state::ReconcileState;
pub(crate) use state::{parse_id_set, parse_ids};
