//! Picks the collection file a new recipe is appended to.

use db::models::collection::Collection;

/// First matching rule wins:
/// 1. "vánoční" or "cukroví" -> christmas
/// 2. "polévky" or any tag containing "krém" -> soups and creams
/// 3. "sladké" -> sweet
/// 4. "slané" -> salty
/// 5. anything else -> sweet
pub fn select_collection(categories: &[String]) -> Collection {
    let has = |tag: &str| categories.iter().any(|c| c == tag);

    if has("vánoční") || has("cukroví") {
        Collection::Christmas
    } else if has("polévky") || categories.iter().any(|c| c.contains("krém")) {
        Collection::SoupsAndCreams
    } else if has("sladké") {
        Collection::Sweet
    } else if has("slané") {
        Collection::Salty
    } else {
        Collection::Sweet
    }
}
