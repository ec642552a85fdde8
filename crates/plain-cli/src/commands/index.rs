use crate::cli::IndexUrlArgs;
use crate::client::{AppContext, CliError, CliResult, DocumentIndexer};
use crate::model::{IndexOutcome, IndexRequest};
use crate::output::render_outcome;

pub(crate) async fn handle_index_url(ctx: &AppContext, args: IndexUrlArgs) -> CliResult<()> {
    let request = IndexRequest::new(args.url, &args.label_type_ids);
    match ctx.plain.submit(&request).await {
        outcome @ IndexOutcome::Success { .. } => {
            render_outcome(&outcome);
            Ok(())
        }
        IndexOutcome::Failure {
            message,
            request_id,
            ..
        } => Err(CliError::Index {
            message,
            request_id,
        }),
    }
}
