//! Typeahead select controls backed by asynchronous search.
//!
//! [`SelectControl`] is the pure state machine, [`Combobox`] runs it against
//! a [`SearchProvider`] on tokio.

mod control;
mod driver;
mod http;
mod labels;
mod option;
mod provider;
mod selection;
mod view;

pub use control::{
    Key, MultiSelect, QueryTicket, ResolveRequest, ResolveResponse, SearchRequest, SearchResponse,
    SelectConfig, SelectControl, SelectEvent, SelectPhase, SingleSelect, Update,
};
pub use driver::{Combobox, DriverConfig, DriverMessage, SearchDriver};
pub use http::HttpSearchProvider;
pub use labels::LabelCache;
pub use option::{OptionId, SelectOption};
pub use provider::{SearchError, SearchProvider, SelectedOptionsResolver, StaticOptions};
pub use selection::Selection;
pub use view::{SelectView, SelectedItem, no_results_message};
