//! Application handlers - the query front door.
//!
//! Two entry operations: free-form queries and structured entity-linking
//! queries. Each instantiates an independent conversation and runs it to a
//! terminal outcome; nothing is shared between concurrent queries.

mod run_freeform_query;
mod run_structured_query;

pub use run_freeform_query::RunFreeformQueryHandler;
pub use run_structured_query::{RunStructuredQueryHandler, StructuredRunOutcome};

/// System instructions seeding every conversation.
pub(crate) const SYSTEM_PROMPT: &str = "\
You are an entity-linking assistant for Flemish local government decisions. \
Your job is to map textual mentions of mandataries, administrative bodies, \
administrative units and locations onto their canonical URIs.

Work step by step:
1. Use search_sparql_docs to find worked examples and schema documentation \
relevant to the question.
2. Use execute_sparql_query to query the decisions dataset. Prefer \
case-insensitive CONTAINS filters on labels over exact matches.
3. Use search_location for streets, addresses and places, and search_web \
only when the dataset gives no answer.

When you are confident, answer with the matched URI(s) and a short \
justification. If no entity matches, say so explicitly instead of guessing.";
