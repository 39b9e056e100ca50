use spotlight_model::{HistoryItem, ModelReply, ModelRequest};
use tracing::Instrument;

use super::{Dispatcher, Turn};
use crate::math;
use crate::result::{ResultItem, extract_file_entries};
use crate::tool::{ToolOutcome, dispatch_all};
use crate::{Error, ErrorKind};

/// Typing this lists the available tools instead of asking the model.
pub(crate) const TOOLS_COMMAND: &str = "/tools";

pub(crate) const SUMMARY_PROMPT: &str = "Summarize the results of the \
    function calls above for the user in a few sentences. Mention the most \
    relevant items by name.";

/// Where a turn currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    /// No turn is running.
    #[default]
    Ready,
    /// Waiting for the model to reply to the query.
    Thinking,
    /// Running the function calls requested by the model.
    CallingTools,
    /// Waiting for the model to summarize the function call outcomes.
    Summarizing,
    /// The last turn failed. The next turn starts from `Ready` again.
    Error,
}

impl Dispatcher {
    /// Runs one turn for the given query.
    ///
    /// The stage is [`Stage::Ready`] or [`Stage::Error`] once this returns.
    pub async fn submit(&mut self, query: &str) -> Turn {
        self.set_stage(Stage::Ready);

        let mut results = vec![];
        let span = info_span!("turn");
        let res = self
            .run_turn(query.trim(), &mut results)
            .instrument(span)
            .await;
        match res {
            Ok(()) => {
                self.set_stage(Stage::Ready);
                Turn {
                    results,
                    error: None,
                }
            }
            Err(err) => {
                warn!("turn failed: {err}");
                self.set_stage(Stage::Error);
                Turn {
                    results,
                    error: Some(err),
                }
            }
        }
    }

    async fn run_turn(
        &mut self,
        query: &str,
        results: &mut Vec<ResultItem>,
    ) -> Result<(), Error> {
        if query.is_empty() {
            return Err(Error::new(ErrorKind::MissingInput));
        }

        if query == TOOLS_COMMAND {
            results.push(ResultItem::ToolList(self.catalog.tools().to_vec()));
            self.publish(results);
            return Ok(());
        }

        if math::looks_like_math(query) {
            match math::evaluate(query) {
                Ok(value) => {
                    debug!("evaluated `{query}` locally");
                    results.push(ResultItem::Math(math::format_number(value)));
                    self.publish(results);
                    return Ok(());
                }
                Err(err) => {
                    debug!("`{query}` is not an expression ({err}), asking the model");
                }
            }
        }

        self.set_stage(Stage::Thinking);
        let request = self.build_request(query);
        self.history.push(HistoryItem::user(query));
        let calls = match self.model_client.send_request(request).await? {
            ModelReply::Text(text) => {
                self.history.push(HistoryItem::model_text(text.clone()));
                results.push(ResultItem::Text(text));
                self.publish(results);
                return Ok(());
            }
            ModelReply::FunctionCalls(calls) => calls,
        };

        if calls.is_empty() {
            return Err(Error::new(ErrorKind::UnexpectedReply)
                .with_reason("the model asked for an empty list of calls"));
        }
        if self.catalog.is_empty() {
            return Err(Error::new(ErrorKind::NoToolsAvailable).with_reason(
                format!("the model asked for {} call(s)", calls.len()),
            ));
        }

        self.set_stage(Stage::CallingTools);
        let outcomes =
            dispatch_all(self.tool_host.as_ref(), &self.catalog, calls.clone())
                .await;
        self.history.push(HistoryItem::function_calls(calls));
        self.history.push(HistoryItem::function_responses(
            outcomes.iter().map(ToolOutcome::to_response),
        ));

        let len_before = results.len();
        results.extend(
            outcomes
                .iter()
                .filter_map(|outcome| outcome.result.as_ref().ok())
                .flat_map(extract_file_entries)
                .map(ResultItem::File),
        );
        if results.len() > len_before {
            self.publish(results);
        }

        self.set_stage(Stage::Summarizing);
        let request = ModelRequest {
            query: SUMMARY_PROMPT.to_owned(),
            history: self.history.items().to_vec(),
            tools: self.catalog.declarations(),
            api_key: self.settings.api_key().map(ToOwned::to_owned),
        };
        match self.model_client.send_request(request).await? {
            ModelReply::Text(summary) => {
                self.history.push(HistoryItem::model_text(summary.clone()));
                results.insert(0, ResultItem::Text(summary));
                self.publish(results);
                Ok(())
            }
            ModelReply::FunctionCalls(calls) => {
                Err(Error::new(ErrorKind::UnexpectedReply).with_reason(format!(
                    "the model asked for {} more call(s) while summarizing",
                    calls.len()
                )))
            }
        }
    }

    fn build_request(&self, query: &str) -> ModelRequest {
        ModelRequest {
            query: query.to_owned(),
            history: self.history.items().to_vec(),
            tools: self.catalog.declarations(),
            api_key: self.settings.api_key().map(ToOwned::to_owned),
        }
    }

    fn set_stage(&mut self, stage: Stage) {
        if self.stage == stage {
            return;
        }
        trace!("stage: {:?} -> {stage:?}", self.stage);
        self.stage = stage;
        if let Some(on_stage) = &self.on_stage {
            on_stage(stage);
        }
    }

    #[inline]
    fn publish(&self, results: &[ResultItem]) {
        if let Some(on_results) = &self.on_results {
            on_results(results);
        }
    }
}
