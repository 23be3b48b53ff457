//! Content-type routing over the ordered path rule table.

use contentcheck::patterns;
use contentcheck::{ContentType, FileLayout};

/// Where a canonical path leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A content file of the given type and layout.
    Content(ContentType, FileLayout),
    /// One of the structural schema definitions; changing it is a schema change.
    Schema,
    /// No rule applies. Not an error by itself.
    Unrecognized,
}

impl Route {
    #[must_use]
    pub fn content_type(self) -> Option<ContentType> {
        match self {
            Self::Content(content_type, _) => Some(content_type),
            Self::Schema | Self::Unrecognized => None,
        }
    }
}

/// Route `path`. The first matching rule wins.
#[must_use]
pub fn route(path: &str) -> Route {
    if let Some(rule) = patterns::match_rule(path) {
        Route::Content(rule.content_type, rule.layout)
    } else if patterns::is_schema_file(path) {
        Route::Schema
    } else {
        Route::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_order() {
        assert_eq!(
            route("TestPlaybooks/playbook-Foo_test.yml"),
            Route::Content(ContentType::TestPlaybook, FileLayout::Single)
        );
        assert_eq!(
            route("Integrations/Foo/Foo.yml"),
            Route::Content(ContentType::Integration, FileLayout::Package)
        );
        assert_eq!(
            route("Beta_Integrations/integration-Foo.yml"),
            Route::Content(ContentType::BetaIntegration, FileLayout::Unified)
        );
        assert_eq!(
            route("Integrations/Foo/Foo_image.png"),
            Route::Content(ContentType::Image, FileLayout::Single)
        );
    }

    #[test]
    fn test_schema_and_unrecognized() {
        assert_eq!(route("Tests/schemas/integration.yml"), Route::Schema);
        assert_eq!(route("docs/README.md"), Route::Unrecognized);
        assert_eq!(route("Integrations/Foo/Bar.yml"), Route::Unrecognized);
    }
}
