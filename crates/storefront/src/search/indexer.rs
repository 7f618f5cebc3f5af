//! Collection lifecycle and document writes.

use tantivy::tokenizer::{
    Language, LowerCaser, RawTokenizer, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer,
};
use tantivy::{Index, IndexWriter, ReloadPolicy, TantivyDocument, Term, doc};
use tracing::{debug, info, instrument};

use cartwheel_core::Product;

use super::{
    RAW_LOWER_TOKENIZER, ReadyIndex, STEM_TOKENIZER, SearchError, SearchFields, SearchIndex,
};

/// Indexing buffer for the single writer thread.
const WRITER_MEMORY_BYTES: usize = 20_000_000;

impl SearchIndex {
    /// Create an empty product collection.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::CollectionExists` if a collection is already live.
    #[instrument(skip(self))]
    pub fn create_collection(&self) -> Result<(), SearchError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| SearchError::Index("Lock poisoned".to_string()))?;
        if guard.is_some() {
            return Err(SearchError::CollectionExists);
        }

        let (schema, fields) = Self::build_schema();
        let index = Index::create_in_ram(schema);
        register_tokenizers(&index);

        let writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)
            .map_err(|e| SearchError::Index(format!("Failed to create writer: {e}")))?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::Index(format!("Failed to create reader: {e}")))?;

        *guard = Some(ReadyIndex {
            index,
            reader,
            writer: std::sync::Mutex::new(writer),
            fields,
        });
        drop(guard);

        info!("Search collection created");
        Ok(())
    }

    /// Drop the product collection and every document in it.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::CollectionMissing` if there is nothing to drop.
    #[instrument(skip(self))]
    pub fn drop_collection(&self) -> Result<(), SearchError> {
        let previous = self
            .inner
            .write()
            .map_err(|_| SearchError::Index("Lock poisoned".to_string()))?
            .take();

        match previous {
            Some(_) => {
                info!("Search collection dropped");
                Ok(())
            }
            None => Err(SearchError::CollectionMissing),
        }
    }

    /// Write one product document and make it visible to readers.
    ///
    /// A document with the same id is replaced.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::CollectionMissing` if there is no collection, or
    /// `SearchError::Index` if the write fails.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub fn create_document(&self, product: &Product) -> Result<(), SearchError> {
        self.write_batch(std::slice::from_ref(product))
    }

    /// Write many product documents with a single commit.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_document`].
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub fn import_documents(&self, products: &[Product]) -> Result<(), SearchError> {
        self.write_batch(products)?;
        debug!(count = products.len(), "Imported documents");
        Ok(())
    }

    // Allow: `ready` borrows from the guard for the duration of the write.
    #[allow(clippy::significant_drop_tightening)]
    fn write_batch(&self, products: &[Product]) -> Result<(), SearchError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| SearchError::Index("Lock poisoned".to_string()))?;
        let ready = guard.as_ref().ok_or(SearchError::CollectionMissing)?;

        let mut writer = ready
            .writer
            .lock()
            .map_err(|_| SearchError::Index("Writer lock poisoned".to_string()))?;

        for product in products {
            writer.delete_term(Term::from_field_text(ready.fields.id, product.id.as_str()));
            writer
                .add_document(product_to_doc(&ready.fields, product))
                .map_err(|e| SearchError::Index(format!("Failed to add document: {e}")))?;
        }

        writer
            .commit()
            .map_err(|e| SearchError::Index(format!("Failed to commit index: {e}")))?;
        ready
            .reader
            .reload()
            .map_err(|e| SearchError::Index(format!("Failed to reload reader: {e}")))?;

        Ok(())
    }
}

/// Register the analyzers referenced by the schema.
fn register_tokenizers(index: &Index) {
    let tokenizer_manager = index.tokenizers();
    tokenizer_manager.register(
        STEM_TOKENIZER,
        TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(40))
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build(),
    );
    tokenizer_manager.register(
        RAW_LOWER_TOKENIZER,
        TextAnalyzer::builder(RawTokenizer::default())
            .filter(LowerCaser)
            .build(),
    );
}

fn product_to_doc(fields: &SearchFields, product: &Product) -> TantivyDocument {
    doc!(
        fields.id => product.id.as_str(),
        fields.name => product.name.as_str(),
        fields.name_text => product.name.as_str(),
        fields.name_raw => product.name.as_str(),
        fields.price => product.price.amount().to_string(),
        fields.sku => product.sku.as_str(),
        fields.image => product.image.as_str(),
        fields.created_at => product.created_at.as_secs_f64(),
    )
}
