#[macro_export]
/**
 A compile time assert, mirroring `static_assert` from C++

 # Examples
 ```
 use hostfs::const_assert;
 const KNOWN_BITS: u16 = 0o6777;
 const_assert!(2 + 2 == 4);
 const_assert!(size_of::<u32>() >= 4, "u32 must be 4 bytes!");
 const_assert!(KNOWN_BITS > 0, "KNOWN_BITS must be positive");
 ```
*/
macro_rules! const_assert {
    ($cond:expr $(,)?) => {
        const _: () = {
            if !$cond {
                panic!(concat!("const assertion failed: ", stringify!($cond)));
            }
        };
    };
    ($cond:expr, $($arg:tt)+) => {
        const _: () = {
            if !$cond {
                panic!($($arg)+);
            }
        };
    };
}

/**
 A helper macro to access fields of a `libc::dirent`/`libc::dirent64` aka 'dirent-type' struct.

 # Safety
 - The caller must ensure that the pointer is valid and points to a 'dirent-type' struct.

 # Field Aliases
 - On Solaris/Illumos/AIX and friends the struct does not carry `d_type` at all,
   so that arm yields `DT_UNKNOWN` and the caller falls back to a stat call.
*/
#[cfg(unix)]
macro_rules! access_dirent {
    ($entry_ptr:expr, d_name) => {{
        //see reference https://github.com/rust-lang/rust/blob/8712e4567551a2714efa66dac204ec7137bc5605/library/std/src/sys/fs/unix.rs#L740
        (&raw const (*$entry_ptr).d_name).cast::<_>() //the array is not guaranteed to actually be [0,256] (can't be worked with by value!)
    }};

    ($entry_ptr:expr, d_type) => {{
        #[cfg(any(
            target_os = "solaris",
            target_os = "illumos",
            target_os = "aix",
            target_os = "nto",
            target_os = "haiku",
        ))]
        {
            libc::DT_UNKNOWN //the struct does not hold the type on these OS'es!
            //https://github.com/rust-lang/rust/blob/d85276b256a8ab18e03b6394b4f7a7b246176db7/library/std/src/sys/fs/unix.rs#L314
        }
        #[cfg(not(any(
            target_os = "solaris",
            target_os = "illumos",
            target_os = "aix",
            target_os = "nto",
            target_os = "haiku",
        )))]
        {
            (*$entry_ptr).d_type
        }
    }};
}

///A macro to access stat entries in a filesystem independent way
#[cfg(unix)]
macro_rules! access_stat {
    ($stat_struct:expr, st_mtimensec) => {{
        #[cfg(target_os = "netbsd")]
        {
            $stat_struct.st_mtimensec as _
        } //why did they do such a specific change

        #[cfg(not(target_os = "netbsd"))]
        {
            $stat_struct.st_mtime_nsec as _
        }
    }};

    ($stat_struct:expr, st_ctimensec) => {{
        #[cfg(target_os = "netbsd")]
        {
            $stat_struct.st_ctimensec as _
        }

        #[cfg(not(target_os = "netbsd"))]
        {
            $stat_struct.st_ctime_nsec as _
        }
    }};

    ($stat_struct:expr, st_birthtimensec) => {{
        #[cfg(target_os = "netbsd")]
        {
            $stat_struct.st_birthtimensec as _
        }

        #[cfg(not(target_os = "netbsd"))]
        {
            $stat_struct.st_birthtime_nsec as _
        }
    }};

    // inode number, normalised to u64 for compatibility
    ($stat_struct:expr, st_ino) => {{
        #[cfg(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        ))]
        {
            $stat_struct.st_ino as u64
        }

        #[cfg(not(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )))]
        {
            $stat_struct.st_ino
        }
    }};

    // Fallback for other fields
    ($stat_struct:expr, $field:ident) => {{ $stat_struct.$field as _ }};
}

/**
 Skips the "." and ".." entries that every directory stream yields.

 Checks `d_type` first because only directories (or the occasional unknown on
 unusual filesystems) can be dot entries, which keeps the byte comparison off
 the hot path for the vast majority of entries.
*/
#[cfg(unix)]
macro_rules! skip_dot_or_dot_dot_entries {
    ($entry:expr, $action:expr) => {{
        #[allow(unused_unsafe)]
        /*
        SAFETY: when calling this macro, the pointer has already been ensured to be non-null
        This is internal only because it relies on internal heuristics/guarantees
        */
        unsafe {
            match access_dirent!($entry, d_type) {
                libc::DT_DIR | libc::DT_UNKNOWN => {
                    let name_ptr: *const u8 = access_dirent!($entry, d_name);
                    match (*name_ptr.add(0), *name_ptr.add(1), *name_ptr.add(2)) {
                        (b'.', 0, _) | (b'.', b'.', 0) => $action,
                        _ => (),
                    }
                }
                _ => (),
            }
        }
    }};
}

/// Macro for safely calling stat-like functions, yielding the raw errno on failure
/// so the caller can decide which codes are values and which are errors.
#[cfg(unix)]
macro_rules! stat_syscall {
    // For fstatat with a directory fd, name pointer and flags
    ($syscall:ident, $fd:expr, $name_ptr:expr, $flags:expr) => {{
        let mut stat_buf = core::mem::MaybeUninit::<libc::stat>::uninit();
        // SAFETY:
        // - The name is guaranteed to be null-terminated (it comes straight from a dirent)
        let res = unsafe { $syscall($fd, $name_ptr, stat_buf.as_mut_ptr(), $flags) };

        if res == 0 {
            // SAFETY: If the return code is 0, we know the stat structure has been properly initialised
            Ok(unsafe { stat_buf.assume_init() })
        } else {
            Err($crate::error::last_errno())
        }
    }};

    // For stat/lstat with path pointer
    ($syscall:ident, $path_ptr:expr) => {{
        let mut stat_buf = core::mem::MaybeUninit::<libc::stat>::uninit();
        // SAFETY: We know the path is valid because internally it's a cstr
        let res = unsafe { $syscall($path_ptr, stat_buf.as_mut_ptr()) };

        if res == 0 {
            // SAFETY: If the return code is 0, we know it's been initialised properly
            Ok(unsafe { stat_buf.assume_init() })
        } else {
            Err($crate::error::last_errno())
        }
    }};
}
