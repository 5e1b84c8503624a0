//! Link type names and their canonical relation types.

use crate::error::{Error, Result};

/// Short link name to relation reference name.
///
/// Lookup is case-insensitive on the name; every name is stored lower-case.
pub const LINK_TYPES: &[(&str, &str)] = &[
    ("parent", "System.LinkTypes.Hierarchy-Reverse"),
    ("child", "System.LinkTypes.Hierarchy-Forward"),
    ("duplicate", "System.LinkTypes.Duplicate-Forward"),
    ("duplicate of", "System.LinkTypes.Duplicate-Reverse"),
    ("related", "System.LinkTypes.Related"),
    ("successor", "System.LinkTypes.Dependency-Forward"),
    ("predecessor", "System.LinkTypes.Dependency-Reverse"),
    ("tested by", "Microsoft.VSTS.Common.TestedBy-Forward"),
    ("tests", "Microsoft.VSTS.Common.TestedBy-Reverse"),
    ("affects", "Microsoft.VSTS.Common.Affects-Forward"),
    ("affected by", "Microsoft.VSTS.Common.Affects-Reverse"),
    ("artifact", "ArtifactLink"),
];

/// Relation type used for parent links of child work items.
pub const PARENT_RELATION: &str = "System.LinkTypes.Hierarchy-Reverse";

/// Relation type used for artifact links (commits, branches, builds, pull requests).
pub const ARTIFACT_RELATION: &str = "ArtifactLink";

/// Resolve a short link name such as `"tested by"` to its relation type.
///
/// Fails with [`Error::UnknownLinkType`] carrying the input as given.
pub fn resolve_link_type(name: &str) -> Result<&'static str> {
    let key = name.to_lowercase();
    LINK_TYPES
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, relation)| *relation)
        .ok_or_else(|| Error::UnknownLinkType(name.to_string()))
}

/// Resolve either a short link name or a literal relation type.
///
/// Literal relation types are matched case-insensitively and returned in
/// their canonical spelling.
pub fn resolve_relation_type(name: &str) -> Result<&'static str> {
    if let Ok(relation) = resolve_link_type(name) {
        return Ok(relation);
    }
    LINK_TYPES
        .iter()
        .find(|(_, relation)| relation.eq_ignore_ascii_case(name))
        .map(|(_, relation)| *relation)
        .ok_or_else(|| Error::UnknownLinkType(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entry_resolves() {
        let expected = [
            ("parent", "System.LinkTypes.Hierarchy-Reverse"),
            ("child", "System.LinkTypes.Hierarchy-Forward"),
            ("duplicate", "System.LinkTypes.Duplicate-Forward"),
            ("duplicate of", "System.LinkTypes.Duplicate-Reverse"),
            ("related", "System.LinkTypes.Related"),
            ("successor", "System.LinkTypes.Dependency-Forward"),
            ("predecessor", "System.LinkTypes.Dependency-Reverse"),
            ("tested by", "Microsoft.VSTS.Common.TestedBy-Forward"),
            ("tests", "Microsoft.VSTS.Common.TestedBy-Reverse"),
            ("affects", "Microsoft.VSTS.Common.Affects-Forward"),
            ("affected by", "Microsoft.VSTS.Common.Affects-Reverse"),
            ("artifact", "ArtifactLink"),
        ];
        assert_eq!(expected.len(), LINK_TYPES.len());
        for (name, relation) in expected {
            assert_eq!(resolve_link_type(name).unwrap(), relation, "{}", name);
        }
    }

    #[test]
    fn test_case_insensitive() {
        let lower = resolve_link_type("related").unwrap();
        assert_eq!(resolve_link_type("RELATED").unwrap(), lower);
        assert_eq!(resolve_link_type("Related").unwrap(), lower);
        assert_eq!(
            resolve_link_type("Tested By").unwrap(),
            "Microsoft.VSTS.Common.TestedBy-Forward"
        );
    }

    #[test]
    fn test_unknown_keeps_original_input() {
        let err = resolve_link_type("bogus").unwrap_err();
        assert!(matches!(&err, Error::UnknownLinkType(input) if input == "bogus"));
        assert_eq!(err.to_string(), "Unknown link type: bogus");

        let err = resolve_link_type("BoGuS").unwrap_err();
        assert!(err.to_string().contains("BoGuS"));
    }

    #[test]
    fn test_no_partial_match() {
        assert!(resolve_link_type("rel").is_err());
        assert!(resolve_link_type(" related").is_err());
    }

    #[test]
    fn test_relation_type_accepts_literal() {
        assert_eq!(
            resolve_relation_type("system.linktypes.related").unwrap(),
            "System.LinkTypes.Related"
        );
        assert_eq!(
            resolve_relation_type("parent").unwrap(),
            "System.LinkTypes.Hierarchy-Reverse"
        );
        assert!(resolve_relation_type("System.LinkTypes.Nope").is_err());
    }
}
