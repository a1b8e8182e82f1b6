//! Turns per-column score tables into a one-to-one mapping.
//!
//! Each column nominates its best field (highest positive score, ties going
//! to the first field name). For every nominated field the columns with the
//! top score compete; a single winner takes the field, a tie is settled by
//! the [`TieResolution`] policy. Losing columns stay unmapped and are never
//! reassigned to a runner-up field.

use std::collections::BTreeMap;

use serde::Serialize;
use tabnorm_model::{ColumnMapping, Mapping, ScoreTable, TieResolution};

/// Final scores for one input column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScores {
    pub column_index: usize,
    pub header: Option<String>,
    pub scores: ScoreTable,
}

/// Columns that tied for a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub field: String,
    pub score: f64,
    pub columns: Vec<usize>,
    /// Column that kept the field, if the policy picked one.
    pub winner: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub mapping: Mapping,
    pub conflicts: Vec<Conflict>,
}

pub fn resolve(columns: &[ColumnScores], policy: TieResolution) -> Resolution {
    let mut mapping = Mapping {
        columns: columns
            .iter()
            .map(|column| ColumnMapping {
                column_index: column.column_index,
                header: column.header.clone(),
                field: None,
                score: column.scores.best().map_or(0.0, |(_, score)| score),
                tied_with: Vec::new(),
                scores: column.scores.as_map().clone(),
            })
            .collect(),
    };

    // field -> (position, score) of nominating columns
    let mut nominations: BTreeMap<&str, Vec<(usize, f64)>> = BTreeMap::new();
    for (position, column) in columns.iter().enumerate() {
        if let Some((field, score)) = column.scores.best()
            && score > 0.0
        {
            nominations.entry(field).or_default().push((position, score));
        }
    }

    let mut conflicts = Vec::new();
    for (field, candidates) in nominations {
        let top = candidates
            .iter()
            .map(|(_, score)| *score)
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = candidates
            .iter()
            .filter(|(_, score)| *score == top)
            .map(|(position, _)| *position)
            .collect();

        if let [only] = tied.as_slice() {
            mapping.columns[*only].field = Some(field.to_string());
            continue;
        }

        let tied_indices: Vec<usize> = tied.iter().map(|p| columns[*p].column_index).collect();
        for position in &tied {
            let own = columns[*position].column_index;
            mapping.columns[*position].tied_with = tied_indices
                .iter()
                .copied()
                .filter(|index| *index != own)
                .collect();
        }
        let winner = match policy {
            TieResolution::Leftmost => tied
                .iter()
                .copied()
                .min_by_key(|position| columns[*position].column_index),
            TieResolution::DropAll => None,
        };
        if let Some(position) = winner {
            mapping.columns[position].field = Some(field.to_string());
        }
        conflicts.push(Conflict {
            field: field.to_string(),
            score: top,
            columns: tied_indices,
            winner: winner.map(|position| columns[position].column_index),
        });
    }

    Resolution { mapping, conflicts }
}
