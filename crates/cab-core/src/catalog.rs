//! Train-number catalog.
//!
//! Uploading a database yields the list of train numbers it contains. Each
//! entry is offered to the user as `'<short name>' (Id=<id>)`; the chosen
//! label is parsed back to recover the id for the `getactions` request.

use crate::model::{Scalar, TrainNumber};
use serde::{Deserialize, Serialize};
use winnow::ascii::space0;
use winnow::combinator::{delimited, preceded};
use winnow::prelude::*;
use winnow::token::{take_till, take_until};

const ID_MARKER: &str = "' (Id=";

impl TrainNumber {
    /// The label shown in the train-number picker.
    pub fn catalog_label(&self) -> String {
        let show = |v: &Option<Scalar>| v.as_ref().map(ToString::to_string).unwrap_or_default();
        format!(
            "'{}' (Id={})",
            show(&self.short_name),
            show(&self.train_number_id)
        )
    }
}

/// Train numbers available in the uploaded database, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<TrainNumber>,
}

impl Catalog {
    pub fn new(entries: Vec<TrainNumber>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TrainNumber] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(TrainNumber::catalog_label).collect()
    }
}

/// Extract the train-number id from a picker label.
///
/// Surrounding whitespace is ignored. Returns `None` when the text is not a
/// catalog label.
pub fn parse_label(label: &str) -> Option<Scalar> {
    let (_, id) = split_label(label)?;
    Some(match id.parse::<i64>() {
        Ok(n) => Scalar::Int(n),
        Err(_) => Scalar::Text(id.to_string()),
    })
}

/// `(short name, id)` of a label.
fn split_label(label: &str) -> Option<(&str, &str)> {
    let mut input = label;
    let parts = catalog_label.parse_next(&mut input).ok()?;
    input.is_empty().then_some(parts)
}

fn catalog_label<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let _ = space0.parse_next(input)?;
    let short = preceded('\'', take_until(0.., ID_MARKER)).parse_next(input)?;
    let id = delimited(ID_MARKER, take_till(1.., ')'), ')').parse_next(input)?;
    let _ = space0.parse_next(input)?;
    Ok((short, id.trim()))
}
