//! Source aggregation: grounding text assembly and ranked citations

use std::collections::HashMap;

use super::links::LinkMap;
use super::search::RetrievedChunk;

/// A ranked, deduplicated source reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Raw source identifier
    pub source_id: String,
    /// Display name (normalized, prefix-stripped)
    pub display: String,
    /// Display URL, when the link map has an entry
    pub url: Option<String>,
    /// How many retrieved chunks came from this source
    pub hits: usize,
}

/// Assembled grounding material for one turn
#[derive(Debug, Clone)]
pub struct GroundingContext {
    /// Chunk texts joined in retrieval order, one paragraph each
    pub context: String,
    /// Sources ranked by descending retrieval frequency
    pub sources: Vec<SourceRef>,
    /// Rendered ordered reference list appended to the final answer
    pub citation_fragment: String,
}

/// Deduplicates and ranks retrieved sources
pub struct SourceAggregator;

impl SourceAggregator {
    /// Aggregate retrieval results into grounding text and ranked,
    /// link-resolved citations.
    ///
    /// Sources are ranked by descending retrieval frequency; ties keep
    /// first-seen order among the retrieved results. A link map miss
    /// falls back to the bare identifier.
    pub fn aggregate(results: &[RetrievedChunk], links: &LinkMap) -> GroundingContext {
        let context = results
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for result in results {
            let count = counts.entry(result.source_id.as_str()).or_insert(0);
            if *count == 0 {
                first_seen.push(result.source_id.as_str());
            }
            *count += 1;
        }

        // Stable sort preserves first-seen order among equal frequencies
        let mut ranked = first_seen;
        ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));

        let sources: Vec<SourceRef> = ranked
            .into_iter()
            .map(|source_id| SourceRef {
                source_id: source_id.to_string(),
                display: links.display_name(source_id),
                url: links.resolve(source_id).map(str::to_string),
                hits: counts[source_id],
            })
            .collect();

        let citation_fragment = render_citations(&sources);

        GroundingContext {
            context,
            sources,
            citation_fragment,
        }
    }
}

/// Render the ordered reference list shown under an answer
fn render_citations(sources: &[SourceRef]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let mut fragment = String::from("Sources:");
    for (i, source) in sources.iter().enumerate() {
        match &source.url {
            Some(url) => {
                fragment.push_str(&format!("\n{}. [{}]({})", i + 1, source.display, url));
            }
            None => {
                fragment.push_str(&format!("\n{}. {}", i + 1, source.display));
            }
        }
    }
    fragment
}
