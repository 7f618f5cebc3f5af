//! Full-text product search using Tantivy.
//!
//! The index is a derived copy of the catalog: every document carries the
//! catalog key of its product as `id`. It lives in RAM and is rebuilt from
//! the catalog at startup and on admin request (see `services::catalog`).
//!
//! The index has a "collection" lifecycle. Until [`SearchIndex::create_collection`]
//! runs, or after [`SearchIndex::drop_collection`], there is no collection and
//! every operation except creation fails with [`SearchError::CollectionMissing`].

mod indexer;

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use rust_decimal::Decimal;
use tantivy::collector::DocSetCollector;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, STORED, STRING, Schema, TextFieldIndexing,
    TextOptions, Value,
};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, Searcher, TantivyDocument, Term};
use tracing::instrument;

use cartwheel_core::{Price, Product, ProductId, UnixTimestamp};

/// Maximum number of hits returned by a search.
pub const MAX_RESULTS: usize = 250;

/// Minimum word length before typo-tolerant matching kicks in.
const FUZZY_MIN_LEN: usize = 4;

const STEM_TOKENIZER: &str = "en_stem";
const RAW_LOWER_TOKENIZER: &str = "raw_lower";

/// Schema field handles for the product collection.
#[derive(Clone, Copy)]
pub struct SearchFields {
    // Stored fields (returned in results)
    pub id: Field,
    pub name: Field,
    pub price: Field,
    pub sku: Field,
    pub image: Field,
    pub created_at: Field,
    // Indexed-only views of `name`
    pub name_text: Field,
    pub name_raw: Field,
}

/// A live collection.
struct ReadyIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: SearchFields,
}

/// The product search index.
///
/// Cheap to clone; clones share the same collection.
#[derive(Clone, Default)]
pub struct SearchIndex {
    inner: Arc<RwLock<Option<ReadyIndex>>>,
}

impl SearchIndex {
    /// Create a handle with no collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a collection currently exists.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Build the schema for the product collection.
    ///
    /// `created_at` is a fast field; results are ordered by it.
    pub(crate) fn build_schema() -> (Schema, SearchFields) {
        let mut schema_builder = Schema::builder();

        // STRING means indexed but not tokenized (exact match)
        let id = schema_builder.add_text_field("id", STRING | STORED);
        let name = schema_builder.add_text_field("name", STORED);
        // Decimal text so prices round-trip exactly
        let price = schema_builder.add_text_field("price", STORED);
        let sku = schema_builder.add_text_field("sku", STORED);
        let image = schema_builder.add_text_field("image", STORED);
        let created_at = schema_builder.add_f64_field(
            "created_at",
            NumericOptions::default()
                .set_stored()
                .set_indexed()
                .set_fast(),
        );

        let stemmed = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(STEM_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );
        let name_text = schema_builder.add_text_field("name_text", stemmed);

        let raw = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(RAW_LOWER_TOKENIZER)
                .set_index_option(IndexRecordOption::Basic),
        );
        let name_raw = schema_builder.add_text_field("name_raw", raw);

        let schema = schema_builder.build();
        let fields = SearchFields {
            id,
            name,
            price,
            sku,
            image,
            created_at,
            name_text,
            name_raw,
        };

        (schema, fields)
    }

    /// Search product names, newest first.
    ///
    /// A product matches when the query is a case-insensitive substring of its
    /// name, or when any query word matches a name word (after stemming, or
    /// within one typo for longer words). A blank query matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::CollectionMissing` if there is no collection, or
    /// `SearchError::Query` if the search itself fails.
    #[instrument(skip(self))]
    // Allow: `ready` borrows from the guard, so the read lock is held for the
    // whole search.
    #[allow(clippy::significant_drop_tightening)]
    pub fn search(&self, query_str: &str) -> Result<Vec<Product>, SearchError> {
        let query_str = query_str.trim().to_lowercase();

        let guard = self
            .inner
            .read()
            .map_err(|_| SearchError::Index("Lock poisoned".to_string()))?;
        let ready = guard.as_ref().ok_or(SearchError::CollectionMissing)?;

        if query_str.is_empty() {
            return Ok(Vec::new());
        }

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        // Substring match on the whole lowercased name
        let pattern = format!(".*{}.*", regex::escape(&query_str));
        let substring = RegexQuery::from_pattern(&pattern, ready.fields.name_raw)
            .map_err(|e| SearchError::Query(format!("Invalid pattern: {e}")))?;
        subqueries.push((Occur::Should, Box::new(substring)));

        // Word matches, run through the same analyzer as the indexed names
        for word in ready.analyze_name(&query_str)? {
            let term = Term::from_field_text(ready.fields.name_text, &word);
            if word.chars().count() >= FUZZY_MIN_LEN {
                subqueries.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(term.clone(), 1, true)),
                ));
            }
            subqueries.push((
                Occur::Should,
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
            ));
        }

        let query = BooleanQuery::new(subqueries);
        let searcher = ready.reader.searcher();
        let hits = searcher
            .search(&query, &DocSetCollector)
            .map_err(|e| SearchError::Query(format!("Search failed: {e}")))?;

        let mut products = collect_products(&searcher, &ready.fields, hits)?;
        products.sort_by(|a, b| {
            b.created_at
                .as_secs_f64()
                .total_cmp(&a.created_at.as_secs_f64())
                .then_with(|| a.id.cmp(&b.id))
        });
        products.truncate(MAX_RESULTS);

        Ok(products)
    }

    /// Fetch one document by product id.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::CollectionMissing` if there is no collection.
    #[instrument(skip(self))]
    #[allow(clippy::significant_drop_tightening)]
    pub fn get_document(&self, id: &ProductId) -> Result<Option<Product>, SearchError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| SearchError::Index("Lock poisoned".to_string()))?;
        let ready = guard.as_ref().ok_or(SearchError::CollectionMissing)?;

        let searcher = ready.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(ready.fields.id, id.as_str()),
            IndexRecordOption::Basic,
        );
        let hits = searcher
            .search(&query, &DocSetCollector)
            .map_err(|e| SearchError::Query(format!("Lookup failed: {e}")))?;

        Ok(collect_products(&searcher, &ready.fields, hits)?
            .into_iter()
            .next())
    }

    /// Get the number of documents in the collection, or 0 if there is none.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|r| r.reader.searcher().num_docs()))
            .unwrap_or(0)
    }
}

impl ReadyIndex {
    /// Tokenize text with the analyzer used for `name_text`.
    fn analyze_name(&self, text: &str) -> Result<Vec<String>, SearchError> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(self.fields.name_text)
            .map_err(|e| SearchError::Query(format!("Missing analyzer: {e}")))?;

        let mut words = Vec::new();
        let mut stream = analyzer.token_stream(text);
        while stream.advance() {
            let word = stream.token().text.clone();
            if !words.contains(&word) {
                words.push(word);
            }
        }
        Ok(words)
    }
}

/// Load and convert every hit.
fn collect_products(
    searcher: &Searcher,
    fields: &SearchFields,
    hits: HashSet<DocAddress>,
) -> Result<Vec<Product>, SearchError> {
    hits.into_iter()
        .map(|address| {
            let doc = searcher
                .doc::<TantivyDocument>(address)
                .map_err(|e| SearchError::Query(format!("Failed to retrieve doc: {e}")))?;
            doc_to_product(fields, &doc)
        })
        .collect()
}

/// Convert a stored document back into a product.
fn doc_to_product(fields: &SearchFields, doc: &TantivyDocument) -> Result<Product, SearchError> {
    let get_text = |field: Field| -> String {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };

    let id = get_text(fields.id);
    if id.is_empty() {
        return Err(SearchError::Query("Document without id".to_string()));
    }

    let price_text = get_text(fields.price);
    let price = Decimal::from_str(&price_text)
        .ok()
        .and_then(|d| Price::new(d).ok())
        .ok_or_else(|| SearchError::Query(format!("Invalid price for {id}: {price_text}")))?;

    let created_at = doc
        .get_first(fields.created_at)
        .and_then(|v| v.as_f64())
        .unwrap_or_default();

    Ok(Product {
        id: ProductId::new(id),
        name: get_text(fields.name),
        price,
        sku: get_text(fields.sku),
        image: get_text(fields.image),
        created_at: UnixTimestamp::from_secs_f64(created_at),
    })
}

/// Search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Collection does not exist")]
    CollectionMissing,
    #[error("Collection already exists")]
    CollectionExists,
    #[error("Index error: {0}")]
    Index(String),
    #[error("Query error: {0}")]
    Query(String),
}
