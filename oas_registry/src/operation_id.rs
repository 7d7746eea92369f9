use crate::path_words::{self, PathFormatError};

/// Builds an operation id from an HTTP method and a path template.
///
/// The method is lower-cased and every path word is appended Pascal-cased.
/// Words addressed by an id placeholder are singularized by stripping one
/// trailing `s`:
///
/// ```
/// use oas_registry::operation_id::synthesize;
///
/// assert_eq!(synthesize("GET", "/users/{userId}").unwrap(), "getUser");
/// assert_eq!(synthesize("POST", "/users").unwrap(), "postUsers");
/// ```
pub fn synthesize(method: &str, path: &str) -> Result<String, PathFormatError> {
    let segments = path_words::split(path)?;

    let mut id = method.to_lowercase();
    for segment in &segments {
        push_pascal(&mut id, segment.word());
    }
    Ok(id)
}

fn push_pascal(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_and_item_ids() {
        assert_eq!(synthesize("GET", "/users/{userId}").unwrap(), "getUser");
        assert_eq!(synthesize("POST", "/users").unwrap(), "postUsers");
        assert_eq!(
            synthesize("GET", "/users/{userId}/orders/{orderId}").unwrap(),
            "getUserOrder"
        );
        assert_eq!(
            synthesize("DELETE", "/users/{userId}/orders").unwrap(),
            "deleteUserOrders"
        );
    }

    #[test]
    fn words_keep_their_inner_case() {
        assert_eq!(
            synthesize("PATCH", "/api/v1/userGroups/{userGroupId}/memberList").unwrap(),
            "patchApiV1UserGroupMemberList"
        );
    }

    #[test]
    fn singularization_is_naive_suffix_stripping() {
        assert_eq!(synthesize("GET", "/addresses/{addressId}").unwrap(), "getAddresse");
        assert_eq!(synthesize("GET", "/status/{statusId}").unwrap(), "getStatu");
    }

    #[test]
    fn non_ascii_words_are_pascal_cased() {
        assert_eq!(synthesize("GET", "/élèves/{élèveId}").unwrap(), "getÉlève");
    }

    #[test]
    fn synthesis_is_deterministic() {
        let first = synthesize("PUT", "/teams/{teamId}/members/{memberId}").unwrap();
        for _ in 0..8 {
            assert_eq!(
                synthesize("PUT", "/teams/{teamId}/members/{memberId}").unwrap(),
                first
            );
        }
        assert_eq!(first, "putTeamMember");
    }

    #[test]
    fn bare_id_placeholder_is_rejected() {
        assert!(matches!(
            synthesize("GET", "/users/{id}"),
            Err(PathFormatError::UnaddressedPlaceholder { .. })
        ));
    }
}
