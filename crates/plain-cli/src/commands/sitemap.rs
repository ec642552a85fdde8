use crate::batch::SitemapBatchIndexer;
use crate::cli::{CreateKnowledgeSourceArgs, IndexSitemapArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::model::{IndexOutcome, IndexRequest};
use crate::output::{render_batch_summary, render_knowledge_source, render_outcome};
use crate::sitemap::HttpSitemapSource;

pub(crate) async fn handle_index_sitemap(
    ctx: &AppContext,
    args: IndexSitemapArgs,
) -> CliResult<()> {
    let sitemaps = HttpSitemapSource::new(ctx.http.clone());
    let result = SitemapBatchIndexer::new(&sitemaps, &ctx.plain, args.policy())
        .run(&args.sitemap_url, &args.label_type_ids, render_outcome)
        .await
        .map_err(CliError::SitemapFetch)?;

    render_batch_summary(&args.sitemap_url, &result);

    if result.is_success() {
        Ok(())
    } else {
        Err(CliError::from_batch(&result))
    }
}

pub(crate) async fn handle_create_knowledge_source(
    ctx: &AppContext,
    args: CreateKnowledgeSourceArgs,
) -> CliResult<()> {
    let request = IndexRequest::new(args.sitemap_url, &args.label_type_ids);
    match ctx.plain.create_knowledge_source(&request).await {
        IndexOutcome::Success { url } => {
            render_knowledge_source(&url);
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
