use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub, SubAssign};

/**
 The owner/group/others read-write-execute mask plus the set-uid and set-gid bits.

 Backed by a `u16` holding the familiar octal layout, so `0o644` means what it
 does everywhere else. On Windows only "is any write bit present" maps to a real
 attribute, so partial masks round-trip lossily there.

 # Examples
 ```
 use hostfs::Permissions;

 let mode = Permissions::OWNER_READ | Permissions::OWNER_WRITE | Permissions::GROUP_READ;
 assert_eq!(mode.bits(), 0o640);
 assert!(mode.contains(Permissions::OWNER_READ));
 assert!(!mode.contains(Permissions::OTHERS_READ));
 assert_eq!(format!("{mode}"), "rw-r-----");
 ```
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions(u16);

impl Permissions {
    pub const OWNER_READ: Self = Self(0o400);
    pub const OWNER_WRITE: Self = Self(0o200);
    pub const OWNER_EXEC: Self = Self(0o100);
    pub const GROUP_READ: Self = Self(0o040);
    pub const GROUP_WRITE: Self = Self(0o020);
    pub const GROUP_EXEC: Self = Self(0o010);
    pub const OTHERS_READ: Self = Self(0o004);
    pub const OTHERS_WRITE: Self = Self(0o002);
    pub const OTHERS_EXEC: Self = Self(0o001);
    pub const SET_UID: Self = Self(0o4000);
    pub const SET_GID: Self = Self(0o2000);

    pub const OWNER_ALL: Self = Self(0o700);
    pub const GROUP_ALL: Self = Self(0o070);
    pub const OTHERS_ALL: Self = Self(0o007);
    pub const ALL_READ: Self = Self(0o444);
    pub const ALL_WRITE: Self = Self(0o222);
    pub const ALL_EXEC: Self = Self(0o111);

    /// Every bit this type knows about.
    pub const MASK: Self = Self(0o6777);

    #[must_use]
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The raw octal bits.
    #[must_use]
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Keeps the known bits of `bits` and drops the rest (file type bits etc).
    #[must_use]
    #[inline]
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & Self::MASK.0)
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` when every bit of `other` is set in `self`.
    #[must_use]
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` when `self` and `other` share at least one bit.
    #[must_use]
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Folds `requested` into `self` according to `op`, yielding the mask an
    /// update would install. Never touches the filesystem.
    #[must_use]
    #[inline]
    pub const fn combine(self, requested: Self, op: PermApply) -> Self {
        match op {
            PermApply::Replace => requested,
            PermApply::Add => Self(self.0 | requested.0),
            PermApply::Remove => Self(self.0 & !requested.0),
        }
    }
}

impl BitOr for Permissions {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Permissions {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Permissions {
    type Output = Self;
    /// Complement within the known bits, stray high bits never appear.
    #[inline]
    fn not(self) -> Self {
        Self(!self.0 & Self::MASK.0)
    }
}

impl Sub for Permissions {
    type Output = Self;
    /// Set difference: the bits of `self` not present in `rhs`.
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

impl SubAssign for Permissions {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 &= !rhs.0;
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({:#o})", self.0)
    }
}

impl fmt::Display for Permissions {
    /// Renders the familiar nine character `rwxr-xr-x` form, with `s`/`S` in
    /// the execute column when set-uid or set-gid is present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const COLUMNS: [(u16, u8); 9] = [
            (0o400, b'r'),
            (0o200, b'w'),
            (0o100, b'x'),
            (0o040, b'r'),
            (0o020, b'w'),
            (0o010, b'x'),
            (0o004, b'r'),
            (0o002, b'w'),
            (0o001, b'x'),
        ];
        let bits = self.0;
        let mut chars = [b'-'; 9];
        for (idx, (bit, ch)) in COLUMNS.iter().enumerate() {
            if bits & bit != 0 {
                chars[idx] = *ch;
            }
        }
        if bits & Self::SET_UID.0 != 0 {
            chars[2] = if bits & Self::OWNER_EXEC.0 != 0 { b's' } else { b'S' };
        }
        if bits & Self::SET_GID.0 != 0 {
            chars[5] = if bits & Self::GROUP_EXEC.0 != 0 { b's' } else { b'S' };
        }
        f.write_str(core::str::from_utf8(&chars).map_err(|_| fmt::Error)?)
    }
}

/// How [`update_permissions`](crate::update_permissions) folds the requested
/// bits into the entry's current mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermApply {
    /// Install exactly the requested bits.
    Replace,
    /// Set the requested bits, leave the rest alone.
    Add,
    /// Clear the requested bits, leave the rest alone.
    Remove,
}

const_assert!(Permissions::MASK.bits() == 0o6777);
const_assert!(
    Permissions::SET_UID.bits() & 0o777 == 0,
    "set-uid must live outside the rwx columns"
);
