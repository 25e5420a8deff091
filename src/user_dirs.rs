use std::path::PathBuf;

/**
The well-known per-user folders a desktop host keeps.

`Home` is the profile root; the rest are the conventional content folders
inside (or wherever the user has pointed them).
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserDir {
    Home,
    Desktop,
    Documents,
    Downloads,
    Music,
    Pictures,
    Videos,
}

#[cfg(unix)]
impl UserDir {
    /// The key xdg-user-dirs writes into `user-dirs.dirs`. `Home` is
    /// answered from the environment before the file is ever read.
    pub(crate) const fn xdg_key(self) -> &'static str {
        match self {
            Self::Home => "XDG_HOME_DIR",
            Self::Desktop => "XDG_DESKTOP_DIR",
            Self::Documents => "XDG_DOCUMENTS_DIR",
            Self::Downloads => "XDG_DOWNLOAD_DIR",
            Self::Music => "XDG_MUSIC_DIR",
            Self::Pictures => "XDG_PICTURES_DIR",
            Self::Videos => "XDG_VIDEOS_DIR",
        }
    }

    /// Folder name under `$HOME` when nothing overrides it.
    pub(crate) const fn default_name(self) -> &'static str {
        match self {
            Self::Home => "",
            Self::Desktop => "Desktop",
            Self::Documents => "Documents",
            Self::Downloads => "Downloads",
            Self::Music => "Music",
            Self::Pictures => "Pictures",
            Self::Videos => "Videos",
        }
    }
}

#[cfg(windows)]
impl UserDir {
    pub(crate) const fn known_folder(self) -> &'static windows_sys::core::GUID {
        use windows_sys::Win32::UI::Shell::{
            FOLDERID_Desktop, FOLDERID_Documents, FOLDERID_Downloads, FOLDERID_Music,
            FOLDERID_Pictures, FOLDERID_Profile, FOLDERID_Videos,
        };
        match self {
            Self::Home => &FOLDERID_Profile,
            Self::Desktop => &FOLDERID_Desktop,
            Self::Documents => &FOLDERID_Documents,
            Self::Downloads => &FOLDERID_Downloads,
            Self::Music => &FOLDERID_Music,
            Self::Pictures => &FOLDERID_Pictures,
            Self::Videos => &FOLDERID_Videos,
        }
    }
}

/**
Where the host keeps one of the well-known user folders, `None` when it has
no answer (headless account, stripped environment).

POSIX answers from `$HOME` and the `user-dirs.dirs` file that xdg-user-dirs
maintains, falling back to the conventional `$HOME/<Name>` layout; Windows
asks the shell's known-folder registry.

# Examples
```no_run
if let Some(downloads) = hostfs::user_dir(hostfs::UserDir::Downloads) {
    println!("{}", downloads.display());
}
```
*/
#[must_use]
pub fn user_dir(which: UserDir) -> Option<PathBuf> {
    crate::sys::user_dir_path(which)
}
