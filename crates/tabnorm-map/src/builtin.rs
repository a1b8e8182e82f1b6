//! Built-in extension package.
//!
//! Registers general-purpose detectors that work with any field set:
//!
//! - Row detectors scoring text density, numeric density and blank rows
//! - A header detector matching column headers against field names, labels
//!   and synonyms (exact, token containment, then Jaro-Winkler similarity)
//! - A value-shape detector rewarding email-shaped values and penalizing
//!   text in numeric fields
//!
//! Fields themselves come from other modules (for example a declarative
//! field schema) composed into the same package.

use rapidfuzz::distance::jaro_winkler;
use tabnorm_catalog::registration::{
    register_column_detector, register_row_detector, register_row_kind,
};
use tabnorm_catalog::{
    ColumnDetector, ColumnDetectorContext, ExtensionModule, ExtensionPackage, RowDetector,
    RowDetectorContext, origin,
};
use tabnorm_model::{CellValue, DATA, Field, HEADER, ScorePatch};

use crate::text::{looks_like_email, normalize_text, token_set};

pub const PACKAGE: &str = "builtin";

/// Row kind for rows with no values.
pub const BLANK: &str = "blank";

/// Minimum Jaro-Winkler similarity for a fuzzy header match.
const FUZZY_THRESHOLD: f64 = 0.9;
const EXACT_SCORE: f64 = 1.0;
const CONTAINMENT_SCORE: f64 = 0.6;
const FUZZY_WEIGHT: f64 = 0.5;
const EMAIL_WEIGHT: f64 = 0.5;
const TYPE_MISMATCH_PENALTY: f64 = -0.25;

/// The `builtin` package with only the built-in detectors.
pub fn package() -> ExtensionPackage {
    ExtensionPackage::new(PACKAGE).with_module(module())
}

/// Module tree registering every built-in detector.
pub fn module() -> ExtensionModule {
    ExtensionModule::namespace(module_path!())
        .with_child(ExtensionModule::new(origin!("rows"), load_rows))
        .with_child(ExtensionModule::new(origin!("columns"), load_columns))
}

fn load_rows() -> anyhow::Result<()> {
    register_row_kind(BLANK)?;
    register_row_detector(RowDetector::new(origin!("text_density"), HEADER, text_density))?;
    register_row_detector(RowDetector::new(
        origin!("numeric_density"),
        DATA,
        numeric_density,
    ))?;
    register_row_detector(RowDetector::new(origin!("blank_row"), BLANK, blank_row))?;
    Ok(())
}

fn load_columns() -> anyhow::Result<()> {
    register_column_detector(ColumnDetector::multi(
        origin!("header_synonyms"),
        header_synonyms,
    ))?;
    register_column_detector(ColumnDetector::multi(origin!("value_shape"), value_shape))?;
    Ok(())
}

fn filled(row: &[CellValue]) -> impl Iterator<Item = &CellValue> {
    row.iter().filter(|cell| !cell.is_missing())
}

/// Share of the row that is filled with non-numeric text, weighted by how
/// much of the sheet width the row covers. Title rows spanning one cell
/// lose to a full header row.
fn text_density(ctx: &mut RowDetectorContext<'_>) -> anyhow::Result<ScorePatch> {
    let filled_count = filled(ctx.row).count();
    if filled_count == 0 {
        return Ok(ScorePatch::none());
    }
    let width = ctx.rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let text_count = filled(ctx.row)
        .filter(|cell| cell.as_number().is_none())
        .count();
    let text_ratio = text_count as f64 / filled_count as f64;
    let fill_ratio = filled_count as f64 / width as f64;
    Ok(ScorePatch::Delta(text_ratio * fill_ratio))
}

fn numeric_density(ctx: &mut RowDetectorContext<'_>) -> anyhow::Result<ScorePatch> {
    let filled_count = filled(ctx.row).count();
    if filled_count == 0 {
        return Ok(ScorePatch::none());
    }
    let numeric = filled(ctx.row)
        .filter(|cell| cell.as_number().is_some())
        .count();
    let ratio = numeric as f64 / filled_count as f64;
    if ratio == 0.0 {
        return Ok(ScorePatch::none());
    }
    Ok(ScorePatch::target(DATA, ratio).and(HEADER, -ratio))
}

fn blank_row(ctx: &mut RowDetectorContext<'_>) -> anyhow::Result<ScorePatch> {
    Ok(if filled(ctx.row).next().is_none() {
        ScorePatch::Delta(1.0)
    } else {
        ScorePatch::none()
    })
}

/// Similarity of a header to one candidate name, in `[0, 1]`.
pub fn header_similarity(header: &str, candidate: &str) -> f64 {
    let normalized_header = normalize_text(header);
    let normalized_candidate = normalize_text(candidate);
    if normalized_header.is_empty() || normalized_candidate.is_empty() {
        return 0.0;
    }

    // 1. Exact match after normalization
    if normalized_header == normalized_candidate {
        return EXACT_SCORE;
    }

    // 2. Every candidate token appears in the header ("Employee Email" ~ email)
    let candidate_tokens = token_set(candidate);
    if !candidate_tokens.is_empty() && candidate_tokens.is_subset(&token_set(header)) {
        return CONTAINMENT_SCORE;
    }

    // 3. Near spelling
    let similarity = jaro_winkler::similarity(
        normalized_header.chars(),
        normalized_candidate.chars(),
    );
    if similarity >= FUZZY_THRESHOLD {
        similarity * FUZZY_WEIGHT
    } else {
        0.0
    }
}

fn candidate_names(field: &Field) -> impl Iterator<Item = &str> {
    std::iter::once(field.name.as_str())
        .chain(field.label.as_deref())
        .chain(field.synonyms.iter().map(String::as_str))
}

fn header_synonyms(ctx: &mut ColumnDetectorContext<'_>) -> anyhow::Result<ScorePatch> {
    let Some(header) = ctx.header else {
        return Ok(ScorePatch::none());
    };
    let mut patch = ScorePatch::none();
    for field in ctx.fields.values() {
        let best = candidate_names(field)
            .map(|name| header_similarity(header, name))
            .fold(0.0, f64::max);
        if best > 0.0 {
            ctx.logger
                .trace(format_args!("header '{header}' ~ '{}': {best:.3}", field.name));
            patch = patch.and(field.name.clone(), best);
        }
    }
    Ok(patch)
}

fn is_email_field(field: &Field) -> bool {
    candidate_names(field).any(|name| token_set(name).contains("email"))
}

fn value_shape(ctx: &mut ColumnDetectorContext<'_>) -> anyhow::Result<ScorePatch> {
    if ctx.sample.is_empty() {
        return Ok(ScorePatch::none());
    }
    let total = ctx.sample.len() as f64;
    let email_ratio = ctx
        .sample
        .iter()
        .filter(|value| value.as_text().is_some_and(looks_like_email))
        .count() as f64
        / total;
    let numeric_ratio = ctx
        .sample
        .iter()
        .filter(|value| value.as_number().is_some())
        .count() as f64
        / total;

    let mut patch = ScorePatch::none();
    for field in ctx.fields.values() {
        if email_ratio > 0.0 && is_email_field(field) {
            patch = patch.and(field.name.clone(), email_ratio * EMAIL_WEIGHT);
        }
        if field.field_type.is_numeric() && numeric_ratio < 0.5 {
            patch = patch.and(field.name.clone(), TYPE_MISMATCH_PENALTY);
        }
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_containment_matches() {
        assert_eq!(header_similarity("First Name", "first_name"), EXACT_SCORE);
        assert_eq!(header_similarity("Employee Email", "email"), CONTAINMENT_SCORE);
        assert_eq!(header_similarity("Favorite Color", "email"), 0.0);
        assert_eq!(header_similarity("Favorite Color", "first_name"), 0.0);
    }

    #[test]
    fn near_spellings_score_below_containment() {
        let score = header_similarity("Frist Name", "first_name");
        assert!(score > 0.0 && score < CONTAINMENT_SCORE, "score was {score}");
    }

    #[test]
    fn blank_header_scores_nothing() {
        assert_eq!(header_similarity("  ", "email"), 0.0);
    }

    #[test]
    fn email_fields_are_recognized_by_synonym() {
        assert!(is_email_field(&Field::new("email")));
        assert!(is_email_field(
            &Field::new("contact").with_synonyms(["Email Address"])
        ));
        assert!(!is_email_field(&Field::new("first_name")));
    }
}
