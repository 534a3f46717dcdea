//! 附件引用
//!
//! 远程附件服务为一次上传返回多个尺寸版本，这里把它们整理成固定的三档引用。

use serde::{Deserialize, Serialize};

/// 远程服务返回的单个尺寸版本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobVariant {
    pub file_id: String,
    #[serde(default)]
    pub file_size: u64,
}

/// 大 / 中 / 小三档附件引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSet {
    pub large: String,
    pub medium: String,
    pub small: String,
}

impl AttachmentSet {
    /// 按尺寸降序取前三个版本；缺失的档位回落到现有最小的版本。
    /// 没有任何版本时返回 `None`。
    pub fn from_variants(mut variants: Vec<BlobVariant>) -> Option<Self> {
        variants.sort_by(|a, b| b.file_size.cmp(&a.file_size));
        variants.truncate(3);

        let smallest = variants.last()?.file_id.clone();
        let mut tiers = variants.into_iter().map(|variant| variant.file_id);

        let large = tiers.next().unwrap_or_else(|| smallest.clone());
        let medium = tiers.next().unwrap_or_else(|| smallest.clone());
        let small = tiers.next().unwrap_or(smallest);

        Some(Self {
            large,
            medium,
            small,
        })
    }
}

/// 本地缓存文件中的一条记录：`{id, attachment}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: String,
    pub attachment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, size: u64) -> BlobVariant {
        BlobVariant {
            file_id: id.to_string(),
            file_size: size,
        }
    }

    #[test]
    fn picks_three_largest_in_descending_order() {
        let set = AttachmentSet::from_variants(vec![
            variant("s", 10),
            variant("xl", 4000),
            variant("m", 100),
            variant("l", 1000),
        ])
        .unwrap();

        assert_eq!(set.large, "xl");
        assert_eq!(set.medium, "l");
        assert_eq!(set.small, "m");
    }

    #[test]
    fn missing_tiers_fall_back_to_smallest() {
        let set = AttachmentSet::from_variants(vec![variant("big", 500), variant("tiny", 5)]).unwrap();
        assert_eq!(set.large, "big");
        assert_eq!(set.medium, "tiny");
        assert_eq!(set.small, "tiny");

        let single = AttachmentSet::from_variants(vec![variant("only", 1)]).unwrap();
        assert_eq!(single.large, "only");
        assert_eq!(single.small, "only");
    }

    #[test]
    fn no_variants_means_no_attachment() {
        assert!(AttachmentSet::from_variants(Vec::new()).is_none());
    }
}
