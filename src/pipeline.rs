//! Batch driver: one lookup and one render per topic, joined in input order.

use crate::fetcher::SummaryProvider;
use crate::format::{self, Mode};
use crate::summary::{SummaryResult, Topic};
use rand::Rng;
use tracing::{debug, info};

/// A topic paired with the result it rendered from
pub type Entry = (Topic, SummaryResult);

/// Look up every topic the mode needs a summary for.
///
/// Quiz and tips never touch the provider; their entries carry an empty
/// result that the templates ignore. A failed lookup stays in its slot and
/// the loop moves on.
pub async fn fetch_all<P>(provider: &P, mode: Mode, topics: &[Topic]) -> Vec<Entry>
where
    P: SummaryProvider,
{
    let mut entries = Vec::with_capacity(topics.len());
    for topic in topics {
        let result = if mode.needs_summary() {
            let result = provider.lookup(topic).await;
            debug!(topic = %topic, found = result.is_found(), "lookup finished");
            result
        } else {
            SummaryResult::Found(String::new())
        };
        entries.push((topic.clone(), result));
    }
    info!(mode = %mode, topics = entries.len(), "batch fetched");
    entries
}

/// Fetch and render a whole batch
pub async fn generate<P, R>(provider: &P, mode: Mode, topics: &[Topic], rng: &mut R) -> String
where
    P: SummaryProvider,
    R: Rng + ?Sized,
{
    let entries = fetch_all(provider, mode, topics).await;
    format::render_batch(mode, &entries, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    /// Answers from a fixed script and records every lookup
    #[derive(Default)]
    struct ScriptedProvider {
        calls: Mutex<Vec<String>>,
    }

    impl SummaryProvider for ScriptedProvider {
        async fn lookup(&self, topic: &Topic) -> SummaryResult {
            self.calls.lock().unwrap().push(topic.to_string());
            match topic.as_str() {
                "Mercury" => SummaryResult::disambiguation(
                    "Mercury",
                    vec!["Mercury (planet)".to_string(), "Mercury (element)".to_string()],
                ),
                "Xyzzy" => SummaryResult::not_found("Xyzzy"),
                "Offline" => SummaryResult::failed("connection refused"),
                other => SummaryResult::Found(format!("{} is a topic. It has facts.", other)),
            }
        }
    }

    fn topics(input: &str) -> Vec<Topic> {
        Topic::parse_batch(input).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    #[tokio::test]
    async fn test_batch_equals_joined_single_outputs() {
        let provider = ScriptedProvider::default();
        let batch = generate(&provider, Mode::Notes, &topics("Mars, Xyzzy"), &mut rng()).await;
        let mars = generate(&provider, Mode::Notes, &topics("Mars"), &mut rng()).await;
        let xyzzy = generate(&provider, Mode::Notes, &topics("Xyzzy"), &mut rng()).await;
        assert_eq!(batch, format!("{}\n\n{}", mars, xyzzy));
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let provider = ScriptedProvider::default();
        let out = generate(
            &provider,
            Mode::Summary,
            &topics("Offline, Mercury, Venus"),
            &mut rng(),
        )
        .await;
        assert!(out.contains("Error fetching summary: connection refused"));
        assert!(out.contains("Multiple options found for 'Mercury'. Try more specific."));
        assert!(out.contains("📝 Summary of Venus\n\nVenus is a topic. It has facts."));
        assert_eq!(
            *provider.calls.lock().unwrap(),
            vec!["Offline", "Mercury", "Venus"]
        );
    }

    #[tokio::test]
    async fn test_quiz_and_tips_skip_lookup() {
        let provider = ScriptedProvider::default();
        let entries = fetch_all(&provider, Mode::Quiz, &topics("Mars")).await;
        assert_eq!(entries.len(), 1);
        let tips = generate(&provider, Mode::Tips, &topics("Mars, Venus"), &mut rng()).await;
        assert!(tips.contains("Revise Venus regularly for exams."));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quiz_batch_shape() {
        let provider = ScriptedProvider::default();
        let out = generate(&provider, Mode::Quiz, &topics("Solar System, Moon"), &mut rng()).await;
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        for block in blocks {
            assert_eq!(block.lines().count(), 12);
        }
    }
}
