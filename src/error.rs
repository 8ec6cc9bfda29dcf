// Copyright (c) 2025 Syswonder
// hvisor is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//     http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR
// FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.
//
// Syswonder Website:
//      https://www.syswonder.org
//
// Authors:
//
use core::fmt::{Debug, Display, Formatter, Result};

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(dead_code, clippy::upper_case_acronyms)]
/// POSIX errno
pub enum GicErrorNum {
    EPERM = 1,      // Operation not permitted.
    ENOENT = 2,     // No such file or directory.
    EIO = 5,        // I/O error.
    EBUSY = 16,     // Device or resource busy.
    ENODEV = 19,    // No such device.
    EINVAL = 22,    // Invalid argument.
    ERANGE = 34,    // Result too large.
    ENOSYS = 38,    // Function not implemented.
    ETIMEDOUT = 110, // Connection timed out.
}

pub struct GicError {
    pub num: GicErrorNum,
    pub loc_line: u32,
    pub loc_col: u32,
    pub loc_file: &'static str,
    pub msg: Option<&'static str>,
}

pub type GicResult<T = ()> = core::result::Result<T, GicError>;

impl GicErrorNum {
    pub fn as_str(&self) -> &'static str {
        use GicErrorNum::*;
        match *self {
            EPERM => "Operation not permitted",
            ENOENT => "No such file or directory",
            EIO => "I/O error",
            EBUSY => "Device or resource busy",
            ENODEV => "No such device",
            EINVAL => "Invalid argument",
            ERANGE => "Math result not representable",
            ENOSYS => "Function not implemented",
            ETIMEDOUT => "Timed out",
        }
    }
}

impl GicError {
    pub fn new(
        num: GicErrorNum,
        loc_file: &'static str,
        loc_line: u32,
        loc_col: u32,
        msg: Option<&'static str>,
    ) -> Self {
        Self {
            num,
            loc_file,
            loc_line,
            loc_col,
            msg,
        }
    }

    /// Negated errno, as handed back across the C boundary.
    pub fn code(&self) -> isize {
        -(self.num as usize as isize)
    }
}

impl Debug for GicError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "[{}:{}:{}] {}",
            self.loc_file,
            self.loc_line,
            self.loc_col,
            self.num.as_str()
        )?;
        if let Some(msg) = self.msg {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}

impl Display for GicError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self.msg {
            Some(msg) => write!(f, "{}: {}", self.num.as_str(), msg),
            None => write!(f, "{}", self.num.as_str()),
        }
    }
}

/// Generate a GicError according to errno and msg.
#[macro_export]
macro_rules! gic_err {
    ($num: ident) => {{
        use $crate::error::{GicError, GicErrorNum::*};
        GicError::new($num, file!(), line!(), column!(), None)
    }};
    ($num: ident, $msg: expr) => {{
        use $crate::error::{GicError, GicErrorNum::*};
        GicError::new($num, file!(), line!(), column!(), Some($msg))
    }};
}

/// Generate an Err including a GicError struct
#[macro_export]
macro_rules! gic_result_err {
    ($num: ident) => {
        Err($crate::gic_err!($num))
    };
    ($num: ident, $msg: expr) => {
        Err($crate::gic_err!($num, $msg))
    };
}
