//! Class to generic shape extraction

use super::{class_of, custom_member_row, degrade, member_visible, source_read, MappingExtractor};
use crate::plan::{MemberMapping, WritePath};
use crate::shape::{ShapeId, ShapePair, TypeDescriptor};
use crate::transformer::ResolveContext;
use crate::{Error, Result};
use std::collections::HashSet;
use tracing::debug;

/// Projects every readable source member into the generic target
pub struct FromSourceExtractor;

impl MappingExtractor for FromSourceExtractor {
    fn name(&self) -> &'static str {
        "from_source"
    }

    fn extract(&self, pair: &ShapePair, ctx: &ResolveContext<'_>) -> Result<Vec<MemberMapping>> {
        if !pair.target.is_generic() {
            return Err(Error::InvalidShape {
                extractor: self.name().to_string(),
                shape: pair.target.clone(),
                message: "target must be the generic map or the generic dynamic object"
                    .to_string(),
            });
        }
        let source_class = class_of(&pair.source, ctx, self.name())?;
        let mut keys = HashSet::new();
        let mut rows = Vec::new();

        for member in &source_class.members {
            if !member_visible(source_class, member, ctx) {
                continue;
            }
            let Some(read) = source_read(source_class, member, ctx) else {
                continue;
            };
            let key = ctx.config.name_convention.key_for(&member.name);
            if !keys.insert(key.clone()) {
                debug!(pair = %pair, member = %member.name, key = %key, "Duplicate key, dropping");
                continue;
            }
            let write = match pair.target {
                ShapeId::Map => WritePath::MapKey { key },
                _ => WritePath::Property { name: key },
            };

            if let Some(mut row) = custom_member_row(pair, write.key(), &write, ctx) {
                row.source_groups = member.groups.clone();
                row.source_ignored = member.ignore;
                rows.push(row);
                continue;
            }

            let sources = member.descriptors();
            let targets: Vec<TypeDescriptor> =
                sources.iter().map(|d| degrade(d, &pair.target)).collect();
            let Some(transformer) = ctx.resolve(&sources, &targets) else {
                debug!(pair = %pair, member = %member.name, "No transformer resolves, dropping");
                continue;
            };

            let mut row = MemberMapping::new(write.key().to_string(), read, write, transformer);
            row.source_groups = member.groups.clone();
            row.max_depth = member.max_depth;
            row.source_ignored = member.ignore;
            rows.push(row);
        }
        Ok(rows)
    }
}
