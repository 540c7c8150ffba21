//! Warning-term matching over headlines.

use index_core::scale::clamp_score;
use index_core::{KeywordCountConfig, KeywordShareConfig, SubScore};

/// Number of distinct terms present in the headline (case-insensitive substring match).
pub fn matched_terms(headline: &str, terms: &[String]) -> usize {
    let lowered = headline.to_lowercase();
    terms
        .iter()
        .filter(|term| !term.is_empty() && lowered.contains(&term.to_lowercase()))
        .count()
}

pub fn mentions_any(headline: &str, terms: &[String]) -> bool {
    matched_terms(headline, terms) > 0
}

/// Drop the trailing " - Publisher" suffix news aggregators append to titles.
pub fn clean_headline(title: &str) -> String {
    match title.rfind(" - ") {
        Some(idx) if idx > 0 => title[..idx].trim().to_string(),
        _ => title.trim().to_string(),
    }
}

/// Share of the scanned headlines that mention any term, scaled to 0-100.
pub fn share(cfg: &KeywordShareConfig, titles: &[String]) -> SubScore {
    if cfg.max_headlines == 0 {
        return SubScore::new(0, "No headlines scanned");
    }

    let hits = titles
        .iter()
        .take(cfg.max_headlines)
        .filter(|t| mentions_any(t, &cfg.terms))
        .count();
    let raw = hits as f64 / cfg.max_headlines as f64 * 100.0 * cfg.amplification;

    SubScore::new(
        clamp_score(raw),
        format!(
            "{hits} of the top {} headlines mention {}",
            cfg.max_headlines,
            cfg.terms.join("/")
        ),
    )
}

/// Fixed points per headline that mentions any term. Evidence is the lead headline.
pub fn count(cfg: &KeywordCountConfig, titles: &[String]) -> SubScore {
    let hits = titles
        .iter()
        .take(cfg.max_headlines)
        .filter(|t| mentions_any(t, &cfg.terms))
        .count();

    let evidence = titles
        .first()
        .map(|t| clean_headline(t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| cfg.placeholder_evidence.clone());

    SubScore::new(clamp_score(hits as f64 * cfg.points_per_hit), evidence)
}
