//! Modal-day estimation and next-occurrence projection.

pub mod alignment;
pub mod countdown;
pub mod modal;

pub use alignment::ex_date_alignment;
pub use countdown::{fallback_date, project_next, CountdownProjector};
pub use modal::{candidate_for_day, modal_day};
