//! 推送平台定义
//!
//! `All` 不是各平台的并集，而是独立的取值，编码时必须优先判断。

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// 单个推送平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformFlag {
    Android,
    Ios,
    WindowsPhone,
}

impl PlatformFlag {
    /// 规范顺序，编码结果依赖这个顺序
    pub const CANONICAL: [PlatformFlag; 3] = [
        PlatformFlag::Android,
        PlatformFlag::Ios,
        PlatformFlag::WindowsPhone,
    ];

    /// 平台名称的小写形式
    pub fn wire_name(self) -> &'static str {
        match self {
            PlatformFlag::Android => "android",
            PlatformFlag::Ios => "ios",
            PlatformFlag::WindowsPhone => "windowsphone",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            PlatformFlag::Android => 0b001,
            PlatformFlag::Ios => 0b010,
            PlatformFlag::WindowsPhone => 0b100,
        }
    }
}

impl fmt::Display for PlatformFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// 平台集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlatformSet(u8);

impl PlatformSet {
    pub const EMPTY: PlatformSet = PlatformSet(0);
    pub const ANDROID: PlatformSet = PlatformSet(PlatformFlag::Android.bit());
    pub const IOS: PlatformSet = PlatformSet(PlatformFlag::Ios.bit());
    pub const WINDOWS_PHONE: PlatformSet = PlatformSet(PlatformFlag::WindowsPhone.bit());

    pub fn contains(self, flag: PlatformFlag) -> bool {
        self.0 & flag.bit() == flag.bit()
    }

    pub fn insert(&mut self, flag: PlatformFlag) {
        self.0 |= flag.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 按规范顺序遍历集合中的平台
    pub fn iter(self) -> impl Iterator<Item = PlatformFlag> {
        PlatformFlag::CANONICAL
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }
}

impl From<PlatformFlag> for PlatformSet {
    fn from(flag: PlatformFlag) -> Self {
        PlatformSet(flag.bit())
    }
}

impl FromIterator<PlatformFlag> for PlatformSet {
    fn from_iter<I: IntoIterator<Item = PlatformFlag>>(iter: I) -> Self {
        let mut set = PlatformSet::EMPTY;
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

impl BitOr for PlatformSet {
    type Output = PlatformSet;

    fn bitor(self, rhs: PlatformSet) -> PlatformSet {
        PlatformSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for PlatformSet {
    fn bitor_assign(&mut self, rhs: PlatformSet) {
        self.0 |= rhs.0;
    }
}

/// 推送目标平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    /// 全部平台
    #[default]
    All,
    /// 指定平台
    Specific(PlatformSet),
}

impl Platform {
    /// 是否包含某个平台；`All` 包含所有平台
    pub fn includes(self, flag: PlatformFlag) -> bool {
        match self {
            Platform::All => true,
            Platform::Specific(set) => set.contains(flag),
        }
    }
}

impl From<PlatformSet> for Platform {
    fn from(set: PlatformSet) -> Self {
        Platform::Specific(set)
    }
}

impl From<PlatformFlag> for Platform {
    fn from(flag: PlatformFlag) -> Self {
        Platform::Specific(flag.into())
    }
}
