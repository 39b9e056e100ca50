mod builder;
mod state;

use std::sync::Arc;

use crate::history::History;
use crate::model_client::ModelClient;
use crate::poller::{PollPolicy, poll_tools};
use crate::result::ResultItem;
use crate::settings::Settings;
use crate::tool::{Catalog, ToolHostObject, ToolInfo};
use crate::Error;
pub use builder::DispatcherBuilder;
pub use state::Stage;

type StageCallback = Box<dyn Fn(Stage) + Send + Sync>;
type ResultsCallback = Box<dyn Fn(&[ResultItem]) + Send + Sync>;

/// Turns queries into results.
///
/// A dispatcher owns the conversation history, the current tool catalog
/// and the stage of the turn in progress. Each call to
/// [`submit`](Self::submit) runs one complete turn: either evaluating a
/// literal arithmetic expression, or asking the model, running the
/// function calls it requests and asking it again to summarize the
/// outcomes.
///
/// Turns never overlap, since `submit` borrows the dispatcher mutably.
/// Dropping the returned future abandons the turn; history items appended
/// before that point are kept.
pub struct Dispatcher {
    model_client: ModelClient,
    tool_host: Arc<dyn ToolHostObject>,
    settings: Settings,
    poll_policy: PollPolicy,
    history: History,
    catalog: Catalog,
    stage: Stage,

    on_stage: Option<StageCallback>,
    on_results: Option<ResultsCallback>,
}

/// What a turn produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Turn {
    /// Results in display order.
    ///
    /// Results produced before an error are kept.
    pub results: Vec<ResultItem>,
    /// The error that ended the turn, if any.
    pub error: Option<Error>,
}

impl Turn {
    /// Returns `true` if the turn completed without error.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Dispatcher {
    /// Returns the conversation history.
    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns the current stage.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the tools offered to the model.
    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the settings in use.
    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the settings; takes effect from the next turn.
    #[inline]
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Replaces the tool catalog without asking the tool host.
    #[inline]
    pub fn set_tools(&mut self, tools: Vec<ToolInfo>) {
        self.catalog = Catalog::new(tools);
    }

    /// Polls the tool host until tools are available, then replaces the
    /// catalog.
    ///
    /// Returns the number of tools in the new catalog, which is zero if the
    /// host never listed any.
    pub async fn refresh_tools(&mut self) -> usize {
        let host = Arc::clone(&self.tool_host);
        let tools = poll_tools(&self.poll_policy, || host.list_tools()).await;
        info!("tool catalog refreshed with {} tool(s)", tools.len());
        self.catalog = Catalog::new(tools);
        self.catalog.tools().len()
    }
}
