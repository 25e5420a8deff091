//Exactly one backend is compiled in; the portable layer only ever touches
//items re-exported here, and both backends export the same set with the same
//signatures.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::*;

#[cfg(not(any(unix, windows)))]
compile_error!("hostfs only knows how to talk to Unix-like and Windows hosts");
