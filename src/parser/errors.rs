use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("http client error: {0}")]
    FailedClient(#[from] reqwest::Error),
    #[error("scrapper selector error: {0}")]
    CrawlerSelectorError(String),
    #[error("tokio task error: {0}")]
    TokioTaskError(#[from] tokio::task::JoinError),
    #[error("upstream responded with status {0}")]
    UpstreamStatus(u16),
    #[error("language model returned no candidates")]
    EmptyCompletion,
    #[error("no JSON object in language model reply")]
    MissingJson,
    #[error("failed to read with serde: {0}")]
    SerdeError(#[from] serde_json::Error),
}
