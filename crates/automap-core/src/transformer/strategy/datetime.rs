//! Date-time conversions

use super::{single, TransformerStrategy};
use crate::shape::{ScalarKind, TypeDescriptor};
use crate::transformer::{ResolveContext, Transformer};

/// Date-time to string and back, using the call's date-time format
pub struct DateTimeStrategy;

impl TransformerStrategy for DateTimeStrategy {
    fn name(&self) -> &'static str {
        "datetime"
    }

    fn priority(&self) -> i32 {
        16
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        _ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        match single(sources, targets)? {
            (TypeDescriptor::DateTime, TypeDescriptor::DateTime) => Some(Transformer::DateTimeCopy),
            (TypeDescriptor::DateTime, TypeDescriptor::Scalar(ScalarKind::String)) => {
                Some(Transformer::DateTimeToString { format: None })
            }
            (TypeDescriptor::Scalar(ScalarKind::String), TypeDescriptor::DateTime) => {
                Some(Transformer::StringToDateTime { format: None })
            }
            _ => None,
        }
    }
}
