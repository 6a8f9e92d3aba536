//! Class to class extraction

use super::{class_of, custom_member_row, member_visible, source_read, target_write, MappingExtractor};
use crate::plan::{MemberMapping, ReadPath};
use crate::shape::ShapePair;
use crate::transformer::{ResolveContext, Transformer};
use crate::Result;
use tracing::debug;

/// Matches every target member to a source member of the same name
pub struct SourceTargetExtractor;

impl MappingExtractor for SourceTargetExtractor {
    fn name(&self) -> &'static str {
        "source_target"
    }

    fn extract(&self, pair: &ShapePair, ctx: &ResolveContext<'_>) -> Result<Vec<MemberMapping>> {
        let source_class = class_of(&pair.source, ctx, self.name())?;
        let target_class = class_of(&pair.target, ctx, self.name())?;
        let mut rows = Vec::new();

        for target_member in &target_class.members {
            if !member_visible(target_class, target_member, ctx) {
                debug!(pair = %pair, member = %target_member.name, "Skipping non-public target member");
                continue;
            }
            let Some(write) = target_write(target_class, target_member) else {
                debug!(pair = %pair, member = %target_member.name, "Target member is not writable");
                continue;
            };

            if let Some(mut row) = custom_member_row(pair, &target_member.name, &write, ctx) {
                row.target_groups = target_member.groups.clone();
                row.max_depth = target_member.max_depth;
                row.target_ignored = target_member.ignore;
                rows.push(row);
                continue;
            }

            let source_name = target_member
                .map_from
                .as_deref()
                .unwrap_or(&target_member.name);
            let source = source_class
                .find_member(source_name)
                .filter(|m| member_visible(source_class, m, ctx))
                .and_then(|m| source_read(source_class, m, ctx).map(|read| (m, read)));

            let Some((source_member, read)) = source else {
                let mandatory = target_class
                    .constructor_param(&target_member.name)
                    .is_some_and(|p| p.is_mandatory());
                if mandatory {
                    // kept so construction reports the missing member
                    let mut row = MemberMapping::new(
                        target_member.name.clone(),
                        ReadPath::Absent,
                        write,
                        Transformer::Copy,
                    );
                    row.target_groups = target_member.groups.clone();
                    rows.push(row);
                } else {
                    debug!(
                        pair = %pair,
                        member = %target_member.name,
                        source_member = %source_name,
                        "No readable source member, dropping"
                    );
                }
                continue;
            };

            let Some(transformer) =
                ctx.resolve(&source_member.descriptors(), &target_member.descriptors())
            else {
                debug!(
                    pair = %pair,
                    member = %target_member.name,
                    "No transformer resolves, dropping"
                );
                continue;
            };

            rows.push(MemberMapping {
                target_member: target_member.name.clone(),
                read,
                write,
                transformer,
                source_groups: source_member.groups.clone(),
                target_groups: target_member.groups.clone(),
                max_depth: target_member.max_depth.or(source_member.max_depth),
                source_ignored: source_member.ignore,
                target_ignored: target_member.ignore,
            });
        }
        Ok(rows)
    }
}
