//! Knowledge-base ingestion and retrieval-augmented answers with citations.

use std::thread;
use std::time::Duration;

use log::{debug, info, trace};
use serde::Serialize;
use thiserror::Error;

use super::{BackendError, ServiceError};

/// Separator placed before every cited reference.
pub const CITATION_SEPARATOR: &str = "\n\n***\n\n <br>";

/// Identifier of an ingestion job.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of an ingestion job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestionStatus {
    Pending,
    Failed,
    Complete,
}

/// Where a retrieved reference came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceLocation {
    /// An object in S3. The URI may be absent in the service response.
    S3 { uri: Option<String> },
    /// Any other location type, by name.
    Other(String),
}

/// A passage the answer was grounded on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievedReference {
    pub text: Option<String>,
    pub location: Option<ReferenceLocation>,
}

/// A citation groups the references backing one span of the answer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Citation {
    pub references: Vec<RetrievedReference>,
}

/// Raw answer from the knowledge base.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Retrieval {
    pub output: String,
    pub citations: Vec<Citation>,
}

/// Answer shaped for the frontend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KnowledgeAnswer {
    pub output: String,
    pub citations: String,
    #[serde(rename = "markdownCitations")]
    pub markdown_citations: String,
    pub urls: Vec<String>,
}

/// Knowledge-base client.
pub trait KnowledgeBase: Send + Sync {
    /// Starts re-indexing the data source.
    fn start_ingestion(&self) -> Result<JobId, BackendError>;

    /// Reports the current state of an ingestion job.
    fn poll_status(&self, job: &JobId) -> Result<IngestionStatus, BackendError>;

    /// Answers `prompt` from the indexed documents.
    fn retrieve_and_generate(&self, prompt: &str) -> Result<Retrieval, BackendError>;
}

/// Bounded exponential backoff for status polling.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 40,
            initial_delay: Duration::from_secs(2),
            multiplier: 1.5,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given 1-based attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let seconds = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = seconds.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }
}

/// Blocking wait between polls.
pub trait Sleep {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Reasons an ingestion did not complete.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to start ingestion: {0}")]
    Start(#[source] BackendError),

    #[error("failed to poll ingestion job {job}: {source}")]
    Poll {
        job: JobId,
        #[source]
        source: BackendError,
    },

    #[error("ingestion job {job} failed")]
    Failed { job: JobId },

    #[error("ingestion job {job} still pending after {attempts} attempts")]
    TimedOut { job: JobId, attempts: u32 },
}

/// Polls `job` until it completes, fails or the retry budget runs out.
pub fn wait_for_ingestion(
    knowledge_base: &dyn KnowledgeBase,
    job: &JobId,
    policy: &RetryPolicy,
    sleeper: &dyn Sleep,
) -> Result<(), IngestionError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let status = knowledge_base
            .poll_status(job)
            .map_err(|source| IngestionError::Poll {
                job: job.clone(),
                source,
            })?;
        trace!("Ingestion job {} attempt {}: {:?}", job, attempt, status);

        match status {
            IngestionStatus::Complete => {
                info!("Ingestion job {} complete", job);
                return Ok(());
            }
            IngestionStatus::Failed => return Err(IngestionError::Failed { job: job.clone() }),
            IngestionStatus::Pending if attempt < attempts => {
                sleeper.sleep(policy.delay_after(attempt));
            }
            IngestionStatus::Pending => {}
        }
    }

    Err(IngestionError::TimedOut {
        job: job.clone(),
        attempts,
    })
}

/// Starts an ingestion job and waits for it.
pub fn ingest(
    knowledge_base: &dyn KnowledgeBase,
    policy: &RetryPolicy,
    sleeper: &dyn Sleep,
) -> Result<JobId, IngestionError> {
    let job = knowledge_base
        .start_ingestion()
        .map_err(IngestionError::Start)?;
    debug!("Started ingestion job {}", job);
    wait_for_ingestion(knowledge_base, &job, policy, sleeper)?;
    Ok(job)
}

/// [`ingest`] that blocks the calling thread between polls.
pub fn ingest_blocking(
    knowledge_base: &dyn KnowledgeBase,
    policy: &RetryPolicy,
) -> Result<JobId, IngestionError> {
    ingest(knowledge_base, policy, &ThreadSleep)
}

/// Formats the citation list and collects the distinct S3 URIs, in first-seen order.
///
/// Every reference adds a separator followed by its text, if any. No references yield an empty
/// citation list.
pub fn answer_with_citations(retrieval: Retrieval) -> KnowledgeAnswer {
    let mut markdown = String::new();
    let mut urls: Vec<String> = Vec::new();

    for reference in retrieval
        .citations
        .iter()
        .flat_map(|citation| citation.references.iter())
    {
        markdown.push_str(CITATION_SEPARATOR);
        if let Some(text) = &reference.text {
            markdown.push_str("\n\n  ");
            markdown.push_str(text);
        }
        if let Some(ReferenceLocation::S3 { uri: Some(uri) }) = &reference.location {
            if !urls.contains(uri) {
                urls.push(uri.clone());
            }
        }
    }

    KnowledgeAnswer {
        output: retrieval.output,
        citations: markdown.clone(),
        markdown_citations: markdown,
        urls,
    }
}

/// Queries the knowledge base and formats the answer.
pub fn ask(knowledge_base: &dyn KnowledgeBase, prompt: &str) -> Result<KnowledgeAnswer, ServiceError> {
    let retrieval = knowledge_base
        .retrieve_and_generate(prompt)
        .map_err(ServiceError::Retrieval)?;
    Ok(answer_with_citations(retrieval))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Mutex;

    use super::*;

    struct ScriptedKnowledgeBase {
        statuses: Mutex<Vec<IngestionStatus>>,
    }

    impl ScriptedKnowledgeBase {
        fn new(mut statuses: Vec<IngestionStatus>) -> Self {
            statuses.reverse();
            Self {
                statuses: Mutex::new(statuses),
            }
        }
    }

    impl KnowledgeBase for ScriptedKnowledgeBase {
        fn start_ingestion(&self) -> Result<JobId, BackendError> {
            Ok(JobId("job-1".to_owned()))
        }

        fn poll_status(&self, _job: &JobId) -> Result<IngestionStatus, BackendError> {
            self.statuses
                .lock()
                .expect("status mutex")
                .pop()
                .ok_or_else(|| "no more statuses".into())
        }

        fn retrieve_and_generate(&self, prompt: &str) -> Result<Retrieval, BackendError> {
            Ok(Retrieval {
                output: format!("answer to {prompt}"),
                citations: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSleep {
        delays: RefCell<Vec<Duration>>,
    }

    impl Sleep for RecordingSleep {
        fn sleep(&self, duration: Duration) {
            self.delays.borrow_mut().push(duration);
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(3),
        }
    }

    #[test]
    fn waits_with_capped_backoff_until_complete() {
        use IngestionStatus::*;
        let kb = ScriptedKnowledgeBase::new(vec![Pending, Pending, Pending, Complete]);
        let sleeper = RecordingSleep::default();

        let job = ingest(&kb, &policy(10), &sleeper).expect("ingestion completes");

        assert_eq!(job, JobId("job-1".to_owned()));
        assert_eq!(
            *sleeper.delays.borrow(),
            [
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3)
            ]
        );
    }

    #[test]
    fn failed_job_stops_polling() {
        use IngestionStatus::*;
        let kb = ScriptedKnowledgeBase::new(vec![Pending, Failed, Complete]);
        let err = ingest(&kb, &policy(10), &RecordingSleep::default()).unwrap_err();
        assert!(matches!(err, IngestionError::Failed { .. }));
    }

    #[test]
    fn pending_job_times_out_without_trailing_sleep() {
        use IngestionStatus::*;
        let kb = ScriptedKnowledgeBase::new(vec![Pending, Pending, Pending]);
        let sleeper = RecordingSleep::default();
        let err = wait_for_ingestion(&kb, &JobId("job-7".to_owned()), &policy(3), &sleeper)
            .unwrap_err();

        assert!(matches!(err, IngestionError::TimedOut { attempts: 3, .. }));
        assert_eq!(sleeper.delays.borrow().len(), 2);
    }

    fn reference(text: Option<&str>, uri: Option<&str>) -> RetrievedReference {
        RetrievedReference {
            text: text.map(str::to_owned),
            location: Some(ReferenceLocation::S3 {
                uri: uri.map(str::to_owned),
            }),
        }
    }

    #[test]
    fn citations_are_listed_and_urls_deduplicated() {
        let retrieval = Retrieval {
            output: "Cap rate is 6%".to_owned(),
            citations: vec![
                Citation {
                    references: vec![
                        reference(Some("NOI was 60k."), Some("s3://docs/a.pdf")),
                        reference(Some("Price was 1M."), Some("s3://docs/b.pdf")),
                    ],
                },
                Citation {
                    references: vec![
                        reference(None, Some("s3://docs/a.pdf")),
                        RetrievedReference {
                            text: Some("Web page.".to_owned()),
                            location: Some(ReferenceLocation::Other("WEB".to_owned())),
                        },
                    ],
                },
            ],
        };

        let answer = answer_with_citations(retrieval);

        assert_eq!(
            answer.markdown_citations,
            "\n\n***\n\n <br>\n\n  NOI was 60k.\
             \n\n***\n\n <br>\n\n  Price was 1M.\
             \n\n***\n\n <br>\
             \n\n***\n\n <br>\n\n  Web page."
        );
        assert_eq!(answer.citations, answer.markdown_citations);
        assert_eq!(answer.urls, ["s3://docs/a.pdf", "s3://docs/b.pdf"]);
    }

    #[test]
    fn ask_passes_the_prompt_through() {
        let kb = ScriptedKnowledgeBase::new(Vec::new());
        let answer = ask(&kb, "vacancy").expect("answer");
        assert_eq!(answer.output, "answer to vacancy");
        assert_eq!(answer.markdown_citations, "");
        assert_eq!(answer.citations, "");
        assert!(answer.urls.is_empty());
    }

    #[test]
    fn each_reference_gets_its_own_separator() {
        let retrieval = Retrieval {
            output: String::new(),
            citations: vec![Citation {
                references: vec![reference(Some("Rent roll."), None)],
            }],
        };
        let answer = answer_with_citations(retrieval);
        assert_eq!(
            answer.markdown_citations,
            format!("{CITATION_SEPARATOR}\n\n  Rent roll.")
        );
        assert_eq!(answer.markdown_citations.matches(CITATION_SEPARATOR).count(), 1);
        assert!(answer.urls.is_empty());
    }

    #[test]
    fn blocking_ingest_sleeps_between_polls() {
        use IngestionStatus::*;
        let kb = ScriptedKnowledgeBase::new(vec![Pending, Complete]);
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            multiplier: 1.0,
            max_delay: Duration::from_millis(5),
        };

        let started = std::time::Instant::now();
        let job = ingest_blocking(&kb, &policy).expect("ingestion completes");

        assert_eq!(job, JobId("job-1".to_owned()));
        assert!(started.elapsed() >= Duration::from_millis(5));
    }
}
