pub mod controller;
pub mod debounce;
pub mod fixture;
pub mod listeners;
pub mod memory;

pub use controller::{
    CreateFormController, EditFormController, FormController, FormEvent, FormMode,
    SubmitOutcome, ViewState,
};
pub use debounce::{Debounced, RequestId, RequestTracker};
pub use fixture::{Fixture, FixtureError};
pub use listeners::{Listener, ListenerRegistry, SubscriptionId};
pub use memory::{InMemoryBackend, Operation};
