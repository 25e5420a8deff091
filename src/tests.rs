use crate::{
    FileType, FsError, PermApply, Permissions, RemoveError, UserDir, absolute, canonical,
    copy_file, create_dir, create_dir_all, create_file, create_hard_link, current_dir, equivalent,
    exists, file_info, hard_link_count, is_directory, is_regular_file, is_symlink, permissions,
    read_dir, read_symlink, remove, remove_all, rename, set_current_dir, set_modified, space,
    symlink_info, update_permissions, user_dir, walk,
};
use std::path::{Path, PathBuf};

fn scratch() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn info_queries_are_total() {
    let dir = scratch();
    let missing = dir.path().join("nothing-here");

    assert_eq!(file_info(&missing).file_type, FileType::NotFound);
    assert_eq!(symlink_info(&missing).file_type, FileType::NotFound);
    assert!(!exists(&missing));
    assert!(!is_directory(&missing));
    assert!(!is_regular_file(&missing));
    assert!(!is_symlink(&missing));
    assert!(permissions(&missing).is_empty());
    assert_eq!(hard_link_count(&missing), 0);

    let file = dir.path().join("data");
    std::fs::write(&file, b"12345").unwrap();
    let info = file_info(&file);
    assert!(info.exists());
    assert!(info.is_regular_file());
    assert_eq!(info.size, 5);
    assert!(info.modified.is_some());
    assert!(is_directory(dir.path()));
    assert_eq!(file_info(dir.path()).size, 0);
}

#[test]
fn create_file_truncates_existing_content() {
    let dir = scratch();
    let file = dir.path().join("log");
    std::fs::write(&file, b"raw bytes").unwrap();
    assert_eq!(file_info(&file).size, 9);

    create_file(&file).unwrap();
    assert_eq!(file_info(&file).size, 0);
    assert!(matches!(
        create_file(&dir.path().join("no/parent")),
        Err(FsError::NotFound)
    ));
}

#[test]
fn create_dir_tolerates_existing_directories() {
    let dir = scratch();
    let d = dir.path().join("d");
    create_dir(&d).unwrap();
    create_dir(&d).unwrap();

    let f = dir.path().join("f");
    create_file(&f).unwrap();
    assert!(matches!(create_dir(&f), Err(FsError::AlreadyExists)));
    assert!(matches!(
        create_dir(&dir.path().join("x/y")),
        Err(FsError::NotFound)
    ));
}

#[test]
fn create_dir_all_builds_the_chain() {
    let dir = scratch();
    let deep = dir.path().join("x/y/z");
    create_dir_all(&deep).unwrap();
    assert!(is_directory(&deep));
    create_dir_all(&deep).unwrap();
    create_dir_all(&dir.path().join("x/y/z/w")).unwrap();
    assert!(matches!(
        create_dir_all(Path::new("")),
        Err(FsError::InvalidPath)
    ));
}

#[test]
fn remove_is_idempotent() {
    let dir = scratch();
    let file = dir.path().join("once");
    create_file(&file).unwrap();
    remove(&file).unwrap();
    assert!(matches!(remove(&file), Err(RemoveError::NotFound)));

    let empty = dir.path().join("empty");
    create_dir(&empty).unwrap();
    remove(&empty).unwrap();
    assert!(!exists(&empty));

    let full = dir.path().join("full");
    create_dir(&full).unwrap();
    create_file(&full.join("occupant")).unwrap();
    assert!(matches!(remove(&full), Err(RemoveError::DirectoryNotEmpty)));
    assert!(exists(&full.join("occupant")));
}

#[test]
fn remove_all_counts_what_it_drains() {
    let dir = scratch();
    let root = dir.path().join("tree");
    create_dir_all(&root.join("a/b")).unwrap();
    std::fs::write(root.join("f0"), b"x").unwrap();
    std::fs::write(root.join("a/f1"), b"x").unwrap();
    std::fs::write(root.join("a/b/f2"), b"x").unwrap();

    // a, a/b, three files and the root itself
    assert_eq!(remove_all(&root).unwrap(), 6);
    assert!(!exists(&root));
    assert_eq!(remove_all(&root).unwrap(), 0);

    let single = dir.path().join("single");
    create_file(&single).unwrap();
    assert_eq!(remove_all(&single).unwrap(), 1);
}

#[test]
fn copy_honours_the_overwrite_guard() {
    let dir = scratch();
    let from = dir.path().join("from");
    let to = dir.path().join("to");
    std::fs::write(&from, b"fresh").unwrap();
    std::fs::write(&to, b"stale").unwrap();

    assert!(matches!(
        copy_file(&from, &to, false),
        Err(FsError::AlreadyExists)
    ));
    assert_eq!(std::fs::read(&to).unwrap(), b"stale");

    copy_file(&from, &to, true).unwrap();
    assert_eq!(std::fs::read(&to).unwrap(), b"fresh");

    let novel = dir.path().join("novel");
    copy_file(&from, &novel, false).unwrap();
    assert_eq!(std::fs::read(&novel).unwrap(), b"fresh");

    assert!(matches!(
        copy_file(&dir.path().join("ghost"), &dir.path().join("out"), false),
        Err(FsError::NotFound)
    ));
}

#[test]
fn rename_moves_and_replaces() {
    let dir = scratch();
    let f = dir.path().join("f");
    let g = dir.path().join("g");
    std::fs::write(&f, b"payload").unwrap();

    rename(&f, &g).unwrap();
    assert!(!exists(&f));
    assert!(is_regular_file(&g));

    let h = dir.path().join("h");
    std::fs::write(&h, b"old").unwrap();
    rename(&g, &h).unwrap();
    assert_eq!(std::fs::read(&h).unwrap(), b"payload");

    assert!(matches!(rename(&f, &g), Err(FsError::NotFound)));
}

#[test]
fn hard_links_share_the_underlying_file() {
    let dir = scratch();
    let original = dir.path().join("original");
    let twin = dir.path().join("twin");
    let clone = dir.path().join("clone");
    std::fs::write(&original, b"same").unwrap();
    std::fs::write(&clone, b"same").unwrap();

    assert!(equivalent(&original, &original).unwrap());
    // equal content is not identity
    assert!(!equivalent(&original, &clone).unwrap());
    assert_eq!(hard_link_count(&original), 1);

    create_hard_link(&original, &twin).unwrap();
    assert_eq!(hard_link_count(&original), 2);
    assert!(equivalent(&original, &twin).unwrap());
    assert!(matches!(
        create_hard_link(&original, &clone),
        Err(FsError::AlreadyExists)
    ));

    assert!(!equivalent(&original, &dir.path().join("void")).unwrap());
    assert!(equivalent(&dir.path().join("void"), &dir.path().join("void2")).is_err());

    remove(&twin).unwrap();
    assert_eq!(hard_link_count(&original), 1);
    assert_eq!(std::fs::read(&original).unwrap(), b"same");
}

#[test]
fn write_bits_toggle_everywhere() {
    let dir = scratch();
    let file = dir.path().join("guarded");
    create_file(&file).unwrap();

    update_permissions(&file, Permissions::ALL_WRITE, PermApply::Remove, true).unwrap();
    assert!(!permissions(&file).intersects(Permissions::ALL_WRITE));

    update_permissions(&file, Permissions::OWNER_WRITE, PermApply::Add, true).unwrap();
    assert!(permissions(&file).intersects(Permissions::ALL_WRITE));

    assert!(matches!(
        update_permissions(
            &dir.path().join("void"),
            Permissions::ALL_WRITE,
            PermApply::Add,
            true
        ),
        Err(FsError::NotFound)
    ));
}

#[cfg(unix)]
#[test]
fn permission_masks_round_trip() {
    let dir = scratch();
    let file = dir.path().join("mode");
    create_file(&file).unwrap();

    let base = Permissions::from_bits_truncate(0o644);
    update_permissions(&file, base, PermApply::Replace, true).unwrap();
    assert_eq!(permissions(&file).bits(), 0o644);

    update_permissions(&file, Permissions::OWNER_EXEC, PermApply::Add, true).unwrap();
    assert_eq!(permissions(&file).bits(), 0o744);

    let group_others = Permissions::GROUP_READ | Permissions::OTHERS_READ;
    update_permissions(&file, group_others, PermApply::Remove, true).unwrap();
    assert_eq!(permissions(&file).bits(), 0o700);

    // installing the current mask again is a silent success
    update_permissions(&file, Permissions::from_bits_truncate(0o700), PermApply::Replace, true)
        .unwrap();
    assert_eq!(permissions(&file).bits(), 0o700);
}

#[cfg(unix)]
#[test]
fn sticky_bit_survives_portable_updates() {
    use std::os::unix::fs::PermissionsExt;

    let dir = scratch();
    let shared = dir.path().join("shared");
    create_dir(&shared).unwrap();
    std::fs::set_permissions(&shared, std::fs::Permissions::from_mode(0o1777)).unwrap();
    let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o7777;

    update_permissions(&shared, Permissions::OTHERS_WRITE, PermApply::Remove, true).unwrap();
    assert_eq!(
        mode(&shared),
        0o1775,
        "an update of other bits cleared the sticky bit"
    );

    update_permissions(&shared, Permissions::OTHERS_WRITE, PermApply::Add, true).unwrap();
    assert_eq!(mode(&shared), 0o1777);

    // Replace swaps the portable bits only
    let fresh = Permissions::OWNER_ALL | Permissions::GROUP_READ | Permissions::GROUP_EXEC;
    update_permissions(&shared, fresh, PermApply::Replace, true).unwrap();
    assert_eq!(mode(&shared), 0o1750);
}

#[test]
fn set_modified_is_exact_and_leaves_access_alone() {
    let dir = scratch();
    let file = dir.path().join("stamped");
    create_file(&file).unwrap();

    let when = chrono::DateTime::from_timestamp(1_600_000_000, 500_000_000).unwrap();
    set_modified(&file, when).unwrap();
    assert_eq!(file_info(&file).modified, Some(when));

    let stamped =
        filetime::FileTime::from_last_modification_time(&std::fs::metadata(&file).unwrap());
    assert_eq!(stamped.unix_seconds(), 1_600_000_000);
    assert_eq!(stamped.nanoseconds(), 500_000_000);

    assert!(matches!(
        set_modified(&dir.path().join("void"), when),
        Err(FsError::NotFound)
    ));
}

#[test]
fn read_symlink_rejects_non_links() {
    let dir = scratch();
    let file = dir.path().join("plain");
    create_file(&file).unwrap();
    assert!(matches!(read_symlink(&file), Err(FsError::NotASymlink)));
    assert!(matches!(
        read_symlink(&dir.path().join("void")),
        Err(FsError::NotFound)
    ));
}

#[test]
fn current_dir_is_absolute_and_resettable() {
    let cwd = current_dir().unwrap();
    assert!(cwd.is_absolute());
    set_current_dir(&cwd).unwrap();
    assert!(matches!(
        set_current_dir(&cwd.join("definitely-not-here-9481")),
        Err(FsError::NotFound)
    ));
}

#[test]
fn absolute_is_purely_textual() {
    let cwd = current_dir().unwrap();
    assert_eq!(absolute(Path::new("b")).unwrap(), cwd.join("b"));
    assert_eq!(absolute(Path::new("a/../b")).unwrap(), cwd.join("b"));
    assert!(matches!(absolute(Path::new("")), Err(FsError::InvalidPath)));
}

#[cfg(unix)]
#[test]
fn absolute_collapses_dot_components() {
    assert_eq!(
        absolute(Path::new("/x/./y/../z")).unwrap(),
        PathBuf::from("/x/z")
    );
    assert_eq!(absolute(Path::new("/../x")).unwrap(), PathBuf::from("/x"));
}

#[test]
fn canonical_needs_an_existing_path() {
    let dir = scratch();
    let d = dir.path().join("d");
    create_dir(&d).unwrap();

    let twisted = dir.path().join("d/../d");
    assert_eq!(canonical(&twisted).unwrap(), canonical(&d).unwrap());
    assert!(canonical(&d).unwrap().is_absolute());
    assert!(matches!(
        canonical(&dir.path().join("void")),
        Err(FsError::NotFound)
    ));
}

#[test]
fn space_reports_sane_numbers() {
    let dir = scratch();
    let usage = space(dir.path()).unwrap();
    assert!(usage.capacity > 0);
    assert!(usage.free <= usage.capacity);
    assert!(usage.available <= usage.free);
    assert!(matches!(
        space(&dir.path().join("void")),
        Err(FsError::NotFound)
    ));
}

#[test]
fn user_home_is_known_and_absolute() {
    let home = user_dir(UserDir::Home).unwrap();
    assert!(home.is_absolute());
    assert!(is_directory(&home));
}

#[test]
fn read_dir_skips_only_the_dot_entries() {
    let dir = scratch();
    std::fs::write(dir.path().join(".hidden"), b"h").unwrap();
    std::fs::write(dir.path().join("visible"), b"vv").unwrap();
    create_dir(&dir.path().join("sub")).unwrap();

    let mut names: Vec<String> = Vec::new();
    for entry in read_dir(dir.path()).unwrap() {
        if entry.file_name() == Some(std::ffi::OsStr::new(".hidden")) {
            assert!(entry.is_regular_file());
            assert_eq!(entry.info().size, 1);
        }
        if entry.file_name() == Some(std::ffi::OsStr::new("sub")) {
            assert!(entry.is_dir());
        }
        names.push(entry.file_name().unwrap().to_string_lossy().into_owned());
    }
    names.sort();
    assert_eq!(names, [".hidden", "sub", "visible"]);

    assert!(matches!(
        read_dir(&dir.path().join("void")),
        Err(FsError::NotFound)
    ));
    assert!(matches!(
        read_dir(&dir.path().join("visible")),
        Err(FsError::NotADirectory)
    ));
}

fn plant_tree(root: &Path) {
    create_dir_all(&root.join("a/b")).unwrap();
    create_dir(&root.join("c")).unwrap();
    std::fs::write(root.join("f0"), b"x").unwrap();
    std::fs::write(root.join("a/f1"), b"x").unwrap();
    std::fs::write(root.join("a/b/f2"), b"x").unwrap();
}

#[test]
fn walk_yields_every_entry_once_parents_first() {
    let dir = scratch();
    let root = dir.path();
    plant_tree(root);

    let seen: Vec<PathBuf> = walk(root).unwrap().map(|entry| entry.into_path()).collect();

    let mut sorted = seen.clone();
    sorted.sort();
    let expected: Vec<PathBuf> = ["a", "a/b", "a/b/f2", "a/f1", "c", "f0"]
        .iter()
        .map(|p| root.join(p))
        .collect();
    assert_eq!(sorted, expected);

    for (idx, path) in seen.iter().enumerate() {
        let parent = path.parent().unwrap();
        if parent != root {
            let parent_idx = seen.iter().position(|p| p == parent).unwrap();
            assert!(parent_idx < idx, "{} before its parent", path.display());
        }
    }
}

#[test]
fn walk_depth_tracks_the_level() {
    let dir = scratch();
    let root = dir.path();
    plant_tree(root);

    let mut walker = walk(root).unwrap();
    while let Some(entry) = walker.next() {
        let below_root = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .components()
            .count();
        assert_eq!(walker.depth(), below_root - 1);
    }
}

#[test]
fn disable_recursion_pending_keeps_the_walk_flat() {
    let dir = scratch();
    let root = dir.path();
    plant_tree(root);

    let mut walker = walk(root).unwrap();
    let mut seen: Vec<PathBuf> = Vec::new();
    while let Some(entry) = walker.next() {
        if entry.is_dir() {
            assert!(walker.recursion_pending());
            walker.disable_recursion_pending();
            assert!(!walker.recursion_pending());
        }
        assert_eq!(walker.depth(), 0);
        seen.push(entry.into_path());
    }
    seen.sort();
    assert_eq!(seen, [root.join("a"), root.join("c"), root.join("f0")]);
}

#[test]
fn pop_abandons_the_current_level() {
    let dir = scratch();
    let root = dir.path();
    create_dir_all(&root.join("a/b")).unwrap();
    std::fs::write(root.join("a/f1"), b"x").unwrap();
    std::fs::write(root.join("a/b/f2"), b"x").unwrap();
    std::fs::write(root.join("f0"), b"x").unwrap();

    let mut walker = walk(root).unwrap();
    let mut popped = false;
    let mut after_pop: Vec<PathBuf> = Vec::new();
    while let Some(entry) = walker.next() {
        if popped {
            after_pop.push(entry.into_path());
        } else if walker.depth() == 1 {
            walker.pop();
            popped = true;
        }
    }
    assert!(popped, "the walk never descended");
    for path in &after_pop {
        assert!(
            !path.starts_with(root.join("a")),
            "{} came back after pop",
            path.display()
        );
    }
}

#[test]
fn walk_of_empty_directory_yields_nothing() {
    let dir = scratch();
    assert_eq!(walk(dir.path()).unwrap().count(), 0);
    assert!(matches!(
        walk(&dir.path().join("void")),
        Err(FsError::NotFound)
    ));
}

#[cfg(unix)]
mod symlinks {
    use crate::{
        FileType, FsError, PermApply, Permissions, canonical, create_dir, create_dir_symlink,
        create_symlink, exists, file_info, is_symlink, permissions, read_symlink, remove,
        remove_all, symlink_info, update_permissions, walk,
    };
    use std::path::{Path, PathBuf};

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("t"), b"content").unwrap();

        let link = root.join("l");
        create_symlink(Path::new("t"), &link).unwrap();
        assert_eq!(read_symlink(&link).unwrap(), PathBuf::from("t"));
        assert!(is_symlink(&link));
        assert!(symlink_info(&link).is_symlink());
        // following the link lands on the file
        assert!(file_info(&link).is_regular_file());
        assert_eq!(file_info(&link).size, 7);

        assert!(matches!(
            create_symlink(Path::new("t"), &link),
            Err(FsError::AlreadyExists)
        ));

        remove(&link).unwrap();
        assert!(exists(&root.join("t")));
    }

    #[test]
    fn dangling_links_are_links_but_do_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("d");
        create_symlink(Path::new("ghost"), &link).unwrap();

        assert!(symlink_info(&link).is_symlink());
        assert_eq!(file_info(&link).file_type, FileType::NotFound);
        assert!(!exists(&link));
    }

    #[test]
    fn walker_reports_links_without_following() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        create_dir(&root.join("t")).unwrap();
        std::fs::write(root.join("t/inner"), b"x").unwrap();
        create_dir_symlink(&root.join("t"), &root.join("l")).unwrap();

        let seen: Vec<PathBuf> = walk(root).unwrap().map(|e| e.into_path()).collect();
        assert!(seen.contains(&root.join("l")));
        assert!(seen.contains(&root.join("t/inner")));
        assert!(
            !seen
                .iter()
                .any(|p| p.starts_with(root.join("l")) && *p != root.join("l"))
        );
    }

    #[test]
    fn remove_all_spares_link_targets() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        create_dir(&root.join("keep")).unwrap();
        std::fs::write(root.join("keep/data"), b"x").unwrap();
        create_dir(&root.join("zone")).unwrap();
        create_dir_symlink(&root.join("keep"), &root.join("zone/k")).unwrap();
        std::fs::write(root.join("zone/f"), b"x").unwrap();

        // zone, the link and the file; nothing behind the link
        assert_eq!(remove_all(&root.join("zone")).unwrap(), 3);
        assert!(exists(&root.join("keep/data")));
    }

    #[test]
    fn permission_updates_respect_the_follow_flag() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let target = root.join("t");
        std::fs::write(&target, b"x").unwrap();
        update_permissions(
            &target,
            Permissions::from_bits_truncate(0o644),
            PermApply::Replace,
            true,
        )
        .unwrap();

        let link = root.join("l");
        create_symlink(&target, &link).unwrap();

        // not following: the link soaks it up as a no-op
        update_permissions(&link, Permissions::empty(), PermApply::Replace, false).unwrap();
        assert_eq!(permissions(&target).bits(), 0o644);

        // following: the write goes through to the target
        update_permissions(
            &link,
            Permissions::from_bits_truncate(0o600),
            PermApply::Replace,
            true,
        )
        .unwrap();
        assert_eq!(permissions(&target).bits(), 0o600);
    }

    #[test]
    fn canonical_resolves_links_absolute_keeps_them() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        create_dir(&root.join("t")).unwrap();
        create_dir_symlink(&root.join("t"), &root.join("l")).unwrap();

        assert_eq!(
            canonical(&root.join("l")).unwrap(),
            canonical(&root.join("t")).unwrap()
        );
        let lexical = crate::absolute(&root.join("l")).unwrap();
        assert!(lexical.ends_with("l"));
    }
}
