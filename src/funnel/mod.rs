//! The quiz funnel: Selector, Questionnaire and Offer stages, the flow that
//! drives them, and the session store and routes that serve them.

pub mod buffer;
pub mod countdown;
pub mod flow;
pub mod markup;
pub mod model;
pub mod offer;
pub mod routes;
pub mod selector;
pub mod sequencer;
pub mod sessions;
pub mod steps;
pub mod view;

pub use countdown::Countdown;
pub use flow::{FunnelDeps, FunnelFlow, Stage, StageName, Transition};
pub use model::{AnswerRecord, Gender};
pub use offer::OfferSettings;
pub use sessions::SessionStore;
pub use view::StageView;
