mod document;

use proc_macro::TokenStream;

/// Derive macro for `cas_economy::Document`.
///
/// The collection becomes the key prefix in the store (`"<collection>:<id>"`).
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Document)]
/// #[document(collection = "u")]
/// struct Player {
///     #[document(id)]
///     handle: String,
///     coins: u64,
/// }
/// ```
///
/// Without `collection`, the snake_case struct name is used. Without a
/// `#[document(id)]` marker, a field named `id` is used.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    document::derive_document(input)
}
