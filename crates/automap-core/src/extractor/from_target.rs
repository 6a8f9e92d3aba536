//! Generic shape to class extraction

use super::{class_of, custom_member_row, degrade, member_visible, target_write, MappingExtractor};
use crate::plan::{MemberMapping, ReadPath};
use crate::shape::{ShapeId, ShapePair, TypeDescriptor};
use crate::transformer::ResolveContext;
use crate::{Error, Result};
use tracing::debug;

/// Reads every target member from the generic source by key
pub struct FromTargetExtractor;

impl MappingExtractor for FromTargetExtractor {
    fn name(&self) -> &'static str {
        "from_target"
    }

    fn extract(&self, pair: &ShapePair, ctx: &ResolveContext<'_>) -> Result<Vec<MemberMapping>> {
        if !pair.source.is_generic() {
            return Err(Error::InvalidShape {
                extractor: self.name().to_string(),
                shape: pair.source.clone(),
                message: "source must be the generic map or the generic dynamic object"
                    .to_string(),
            });
        }
        let target_class = class_of(&pair.target, ctx, self.name())?;
        let mut rows = Vec::new();

        for member in &target_class.members {
            if !member_visible(target_class, member, ctx) {
                continue;
            }
            let Some(write) = target_write(target_class, member) else {
                continue;
            };

            if let Some(mut row) = custom_member_row(pair, &member.name, &write, ctx) {
                row.target_groups = member.groups.clone();
                row.max_depth = member.max_depth;
                row.target_ignored = member.ignore;
                rows.push(row);
                continue;
            }

            let key = member
                .map_from
                .clone()
                .unwrap_or_else(|| ctx.config.name_convention.key_for(&member.name));
            let targets = member.descriptors();
            let sources: Vec<TypeDescriptor> =
                targets.iter().map(|d| degrade(d, &pair.source)).collect();
            let Some(transformer) = ctx.resolve(&sources, &targets) else {
                debug!(pair = %pair, member = %member.name, "No transformer resolves, dropping");
                continue;
            };

            let read = match pair.source {
                ShapeId::Map => ReadPath::MapKey(key),
                _ => ReadPath::Property(key),
            };
            let mut row = MemberMapping::new(member.name.clone(), read, write, transformer);
            row.target_groups = member.groups.clone();
            row.max_depth = member.max_depth;
            row.target_ignored = member.ignore;
            rows.push(row);
        }
        Ok(rows)
    }
}
