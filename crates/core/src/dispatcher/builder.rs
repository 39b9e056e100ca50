use std::sync::Arc;

use spotlight_model::ModelProvider;

use super::{Dispatcher, ResultsCallback, Stage, StageCallback};
use crate::model_client::ModelClient;
use crate::poller::PollPolicy;
use crate::result::ResultItem;
use crate::settings::Settings;
use crate::tool::{AnyToolHost, NoToolHost, ToolHost, ToolHostObject};

/// [`Dispatcher`] builder.
pub struct DispatcherBuilder {
    model_client: ModelClient,
    tool_host: Option<Arc<dyn ToolHostObject>>,
    settings: Settings,
    poll_policy: PollPolicy,
    on_stage: Option<StageCallback>,
    on_results: Option<ResultsCallback>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tool_host: None,
            settings: Default::default(),
            poll_policy: Default::default(),
            on_stage: None,
            on_results: None,
        }
    }

    /// Sets the host that lists and runs tools.
    ///
    /// Without one, the dispatcher never has any tools.
    #[inline]
    pub fn with_tool_host<T: ToolHost>(mut self, tool_host: T) -> Self {
        self.tool_host = Some(Arc::new(AnyToolHost(tool_host)));
        self
    }

    /// Sets the initial settings.
    #[inline]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets how [`Dispatcher::refresh_tools`] retries.
    #[inline]
    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    /// Attaches a callback to be invoked when the stage changes.
    #[inline]
    pub fn on_stage(
        mut self,
        on_stage: impl Fn(Stage) + Send + Sync + 'static,
    ) -> Self {
        self.on_stage = Some(Box::new(on_stage));
        self
    }

    /// Attaches a callback to be invoked with the results of the current
    /// turn whenever they change.
    #[inline]
    pub fn on_results(
        mut self,
        on_results: impl Fn(&[ResultItem]) + Send + Sync + 'static,
    ) -> Self {
        self.on_results = Some(Box::new(on_results));
        self
    }

    /// Builds the dispatcher.
    ///
    /// The tool catalog starts empty, call
    /// [`Dispatcher::refresh_tools`] to fill it.
    pub fn build(self) -> Dispatcher {
        let Self {
            model_client,
            tool_host,
            settings,
            poll_policy,
            on_stage,
            on_results,
        } = self;

        Dispatcher {
            model_client,
            tool_host: tool_host
                .unwrap_or_else(|| Arc::new(AnyToolHost(NoToolHost))),
            settings,
            poll_policy,
            history: Default::default(),
            catalog: Default::default(),
            stage: Default::default(),
            on_stage,
            on_results,
        }
    }
}
