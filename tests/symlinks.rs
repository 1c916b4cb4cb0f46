// tests/symlinks.rs

//! Integration tests for symlink handling during relocation.

mod common;

use common::Fixture;
use keg_relocate::Keg;
use keg_relocate::filesystem::normalize;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::PathBuf;

#[test]
fn test_freeze_relativizes_links_into_prefix() {
    let fixture = Fixture::new();
    let target = fixture.locations.prefix.join("opt/openssl/lib/libssl.so");
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(&target, b"ssl").unwrap();
    let link = fixture.path("lib/libssl.so");
    symlink(&target, &link).unwrap();

    fixture.relocator().freeze(&fixture.keg).unwrap();

    let new_target = fs::read_link(&link).unwrap();
    assert!(new_target.is_relative());
    assert_eq!(normalize(link.parent().unwrap().join(&new_target)), target);
    assert_eq!(fs::read(&link).unwrap(), b"ssl");
}

#[test]
fn test_freeze_relativizes_links_within_keg() {
    let fixture = Fixture::new();
    fixture.write("bin/foo-1.0", "#!/bin/sh\n");
    let link = fixture.path("bin/foo");
    symlink(fixture.path("bin/foo-1.0"), &link).unwrap();

    fixture.relocator().freeze(&fixture.keg).unwrap();

    assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("foo-1.0"));
}

#[test]
fn test_freeze_leaves_other_links_alone() {
    let fixture = Fixture::new();
    let relative = fixture.path("bin/relative");
    let external = fixture.path("bin/external");
    symlink("../share/foo", &relative).unwrap();
    symlink("/usr/bin/env", &external).unwrap();

    fixture.relocator().freeze(&fixture.keg).unwrap();

    assert_eq!(fs::read_link(&relative).unwrap(), PathBuf::from("../share/foo"));
    assert_eq!(fs::read_link(&external).unwrap(), PathBuf::from("/usr/bin/env"));
}

#[test]
fn test_thaw_skip_linkage_leaves_links() {
    let fixture = Fixture::new();
    let target = fixture.locations.prefix.join("bin/tool");
    let link = fixture.path("bin/tool");
    symlink(&target, &link).unwrap();

    let options = keg_relocate::ThawOptions {
        files: None,
        skip_linkage: true,
    };
    fixture.relocator().thaw(&fixture.keg, &options).unwrap();

    assert_eq!(fs::read_link(&link).unwrap(), target);
}

#[test]
fn test_symlinked_text_file_not_rewritten() {
    let fixture = Fixture::new();
    let outside = fixture.temp_dir.path().join("outside.la");
    let original = format!("libdir='{}/lib'\n", fixture.prefix());
    fs::write(&outside, &original).unwrap();
    symlink(&outside, fixture.path("lib/libfoo.la")).unwrap();

    let changes = fixture.relocator().freeze(&fixture.keg).unwrap();

    assert!(changes.is_empty());
    assert_eq!(fs::read_to_string(&outside).unwrap(), original);
}

#[test]
fn test_keg_opened_through_opt_link_keeps_link() {
    let fixture = Fixture::new();
    fixture.write("lib/libfoo.la", &format!("libdir='{}/lib'\n", fixture.prefix()));
    let opt_link = fixture.locations.prefix.join("opt/foo");
    fs::create_dir_all(opt_link.parent().unwrap()).unwrap();
    symlink(fixture.keg.path(), &opt_link).unwrap();
    let keg = Keg::new(&opt_link, "foo").unwrap();

    let changes = fixture.relocator().freeze(&keg).unwrap();

    assert_eq!(fs::read_link(&opt_link).unwrap(), fixture.keg.path());
    assert!(changes.contains("lib/libfoo.la"));
    assert!(fixture.read("lib/libfoo.la").contains(keg_relocate::PREFIX_PLACEHOLDER));
}
