//! `Link` header handling for GitHub's paginated endpoints.

use std::collections::HashMap;

/// Parse an RFC 8288 `Link` header into `rel -> url`.
///
/// `<https://api.github.com/orgs/acme/members?page=2>; rel="next", <...>; rel="last"`
pub fn parse_link_header(value: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();
    for part in value.split(',') {
        let mut segments = part.split(';');
        let Some(target) = segments.next() else {
            continue;
        };
        let target = target.trim();
        let Some(url) = target
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
        else {
            continue;
        };

        for param in segments {
            let Some((key, rel)) = param.split_once('=') else {
                continue;
            };
            if key.trim() != "rel" {
                continue;
            }
            // a single rel attribute may name several relations
            for name in rel.trim().trim_matches('"').split_whitespace() {
                links.insert(name.to_string(), url.to_string());
            }
        }
    }
    links
}
