//! Resolver tests against a file-backed directory.
//!
//! Tests verify:
//! - Short and padded merchant codes resolve to the same entry
//! - Only the segment after the first delimiter names the merchant
//! - Peer duties get an advisory access error, the supervisor never does
//! - House members and unknown merchants fall back to the house merchant
//! - An unreachable directory never surfaces an error

use riskdesk::config::{Config, ResolverConfig};
use riskdesk::directory::{DirectoryLayout, DirectoryRefresh, DutyDirectory, StaticDirectorySource};
use riskdesk::resolver::DutyResolver;
use riskdesk_shared::duty::DutyId;
use std::fs;
use std::sync::Arc;

const SHEET: &str = "Merchant duty list\n\
    ID,Name,ID,Name,ID,Name,ID,Name\n\
    017,Alpha,129,Bravo,300,Charlie,501,QQ288\n\
    7,Seven,,,,,,\n";

fn file_resolver() -> (tempfile::TempDir, DutyResolver) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("directory.csv");
    fs::write(&path, SHEET).unwrap();

    let mut config = Config::default();
    config.directory.source_path = path.display().to_string();
    let directory = Arc::new(DutyDirectory::from_config(&config.directory));
    (dir, DutyResolver::new(directory, config.resolver))
}

#[test]
fn test_padding_equivalence() {
    let (_dir, resolver) = file_resolver();
    for duty in DutyId::ALL {
        assert_eq!(
            resolver.resolve("user@17", duty),
            resolver.resolve("user@017", duty)
        );
    }
}

#[test]
fn test_trailing_segment_after_merchant_ignored() {
    let (_dir, resolver) = file_resolver();
    let res = resolver.resolve("user@017@x", DutyId::Ic1);
    assert_eq!(res.owner_name, "Alpha");
    assert_eq!(res.owning_duty, Some(DutyId::Ic1));
    assert!(!res.has_access_error());
}

#[test]
fn test_unpadded_identifier_not_found_after_padding() {
    let (_dir, resolver) = file_resolver();
    // "7" is padded to "007" and "0007"; the sheet's raw "7" never matches
    let res = resolver.resolve("user@7", DutyId::Ic1);
    assert_eq!(res.owner_name, "QQ288");
    assert_eq!(res.owning_duty, Some(DutyId::Ic5));
}

#[test]
fn test_access_matrix() {
    let (_dir, resolver) = file_resolver();
    for acting in DutyId::ALL {
        let res = resolver.resolve("user@300", acting);
        assert_eq!(res.owner_name, "Charlie");
        let denied = !acting.is_superuser() && acting != DutyId::Ic3;
        assert_eq!(res.has_access_error(), denied, "{}", acting);
    }
}

#[test]
fn test_house_member_never_denied() {
    let (_dir, resolver) = file_resolver();
    // QQ288 is owned by IC5 in the sheet; house members stay allowed
    let res = resolver.resolve("plainuser", DutyId::Ic1);
    assert_eq!(res.owner_name, "QQ288");
    assert!(!res.has_access_error());
}

#[test]
fn test_custom_resolver_config() {
    let directory = DutyDirectory::new(
        Box::new(StaticDirectorySource::new("h\nh\nxx9,Ninth\n")),
        DirectoryLayout::default(),
    );
    directory.refresh();
    let config = ResolverConfig {
        delimiter: '#',
        pad_char: 'x',
        house_merchant: "HOUSE".to_string(),
        ..ResolverConfig::default()
    };
    let resolver = DutyResolver::new(Arc::new(directory), config);

    assert_eq!(resolver.resolve("user#9", DutyId::Ic1).owner_name, "Ninth");
    assert_eq!(resolver.resolve("user@9", DutyId::Ic1).owner_name, "HOUSE");
}

#[test]
fn test_unavailable_directory_falls_back() {
    let directory = DutyDirectory::new(
        Box::new(StaticDirectorySource::unavailable()),
        DirectoryLayout::default(),
    );
    assert_eq!(directory.refresh(), DirectoryRefresh::Unavailable);
    let resolver = DutyResolver::new(Arc::new(directory), ResolverConfig::default());

    let res = resolver.resolve("user@017", DutyId::Ic2);
    assert_eq!(res.owner_name, "QQ288");
    assert_eq!(res.owning_duty, None);
    assert!(!res.has_access_error());
}
