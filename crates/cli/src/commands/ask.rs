//! `lectern ask` — One-shot course-scoped question answering.

use std::path::Path;
use std::sync::Arc;

use lectern_chain::{
    NamespaceBudgetedRetriever, PromptAssembler, QaOrchestrator, RateLimiter, RetrieverConfig,
    RetryExecutor, RetryPolicy,
};
use lectern_config::AppConfig;
use lectern_core::CourseCatalog;
use lectern_providers::{OpenAiCompatClient, PineconeIndexClient};

pub async fn run(
    config_path: &Path,
    course: &str,
    question: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_from(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API keys early — give a clear error
    if config.embedding.api_key.is_none() || config.generation.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY                 (used for embeddings and generation)");
        eprintln!("    LECTERN_EMBEDDING_API_KEY      (embeddings only)");
        eprintln!("    LECTERN_GENERATION_API_KEY     (generation only)");
        eprintln!();
        eprintln!("  Or add them to your config file: {}", config_path.display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let catalog = CourseCatalog::from_json_file(&config.catalog_path)?;
    let namespaces = catalog
        .namespaces_for(course)
        .ok_or_else(|| format!("Unknown course: {course} (try `lectern catalog`)"))?
        .to_vec();

    let embeddings = Arc::new(
        OpenAiCompatClient::new(
            &config.embedding.api_url,
            config.embedding.api_key.clone().unwrap_or_default(),
        )
        .with_embedding_model(&config.embedding.model),
    );
    let model = Arc::new(
        OpenAiCompatClient::new(
            &config.generation.api_url,
            config.generation.api_key.clone().unwrap_or_default(),
        )
        .with_chat_model(&config.generation.model)
        .with_temperature(config.generation.temperature),
    );
    let index = Arc::new(PineconeIndexClient::new(
        &config.index.api_url,
        config.index.api_key.clone().unwrap_or_default(),
    ));

    let limiter = Arc::new(RateLimiter::new(config.rate_limit.max_requests_per_minute));
    let retry = RetryExecutor::new(
        limiter,
        RetryPolicy::new(
            config.retry.max_retries,
            std::time::Duration::from_millis(config.retry.base_delay_ms),
            std::time::Duration::from_millis(config.retry.max_delay_ms),
        ),
    );
    let retriever = NamespaceBudgetedRetriever::new(
        embeddings,
        index,
        retry.clone(),
        RetrieverConfig {
            document_budget: config.retrieval.document_budget,
            per_namespace_top_k: config.retrieval.per_namespace_top_k,
            max_namespaces: config.retrieval.max_namespaces,
        },
    );
    let orchestrator = QaOrchestrator::new(
        retriever,
        PromptAssembler::new(config.prompt.character_budget),
        model,
        retry,
        namespaces,
        config.history.buffer_max_size,
    );

    let result = orchestrator.call(question.trim(), "", course).await?;

    println!("{}", result.answer);
    if !result.source_documents.is_empty() {
        println!();
        println!("Sources:");
        for document in result.source_documents.iter() {
            println!(
                "  - {} (page {} of {})",
                document.source, document.page_number, document.total_pages
            );
        }
    }

    Ok(())
}
