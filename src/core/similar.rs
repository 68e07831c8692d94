use crate::domain::model::Cocktail;
use std::collections::{BTreeSet, HashSet};

/// 相似雞尾酒候選：shared 是與來源酒譜重疊的成分數
#[derive(Debug, Clone)]
pub struct SimilarCocktail {
    pub cocktail: Cocktail,
    pub shared: usize,
}

/// 「手上的材料能調什麼」的單筆結果
#[derive(Debug, Clone)]
pub struct IngredientMatch {
    pub cocktail: Cocktail,
    pub matched: usize,
    pub missing: usize,
}

impl IngredientMatch {
    pub fn is_full_match(&self) -> bool {
        self.missing == 0
    }

    pub fn matched_ratio(&self) -> f64 {
        let total = self.matched + self.missing;
        if total == 0 {
            0.0
        } else {
            self.matched as f64 / total as f64
        }
    }
}

/// 依成分集合交集大小排名候選酒譜。
///
/// 去重（以 slug 為準，來源自己排除），分數高者在前，
/// 同分依名稱排序讓結果穩定，最後截到 limit。
/// 第二階段（tag fallback）來的候選可能交集為 0，仍保留在隊尾。
pub fn rank_similar(
    source: &Cocktail,
    candidates: Vec<Cocktail>,
    limit: usize,
) -> Vec<SimilarCocktail> {
    let source_slugs = source.ingredient_slugs();

    let mut seen = HashSet::new();
    let mut ranked: Vec<SimilarCocktail> = candidates
        .into_iter()
        .filter(|candidate| candidate.slug != source.slug)
        .filter(|candidate| seen.insert(candidate.slug.clone()))
        .map(|candidate| {
            let shared = candidate
                .ingredient_slugs()
                .intersection(&source_slugs)
                .count();
            SimilarCocktail {
                cocktail: candidate,
                shared,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.shared
            .cmp(&a.shared)
            .then_with(|| a.cocktail.name.cmp(&b.cocktail.name))
    });
    ranked.truncate(limit);
    ranked
}

/// 依「已有成分」計算每杯酒的 matched / missing 數並排名。
///
/// 完全可調的在最前面，其後依 matched 多、missing 少、名稱排序。
/// 一項都對不上的候選直接剔除。
pub fn rank_matches(pantry: &BTreeSet<String>, candidates: Vec<Cocktail>) -> Vec<IngredientMatch> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<IngredientMatch> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.slug.clone()))
        .filter_map(|candidate| {
            let slugs = candidate.ingredient_slugs();
            let matched = slugs.intersection(pantry).count();
            if matched == 0 {
                return None;
            }
            let missing = slugs.len() - matched;
            Some(IngredientMatch {
                cocktail: candidate,
                matched,
                missing,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.is_full_match()
            .cmp(&a.is_full_match())
            .then_with(|| b.matched.cmp(&a.matched))
            .then_with(|| a.missing.cmp(&b.missing))
            .then_with(|| a.cocktail.name.cmp(&b.cocktail.name))
    });
    ranked
}
