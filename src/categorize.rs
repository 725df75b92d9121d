//! Rule-based place categorization.
//!
//! Categories are decided by an ordered decision list over a
//! [`TemporalPattern`]. The first rule that matches wins, so a pattern that
//! satisfies several rules always takes the earliest one:
//!
//! | Order | Category | Predicate |
//! |---|---|---|
//! | 1 | Home | night ratio, dwell >= 6h, >= 5 visits/week |
//! | 2 | Work | 09-17 ratio, weekday share, dwell >= 4h |
//! | 3 | Gym | morning + evening ratio, dwell 30min-4h, >= 1 visit/week |
//! | 4 | Restaurant | lunch + dinner ratio, dwell in the restaurant window |
//! | 5 | Shopping | dwell in the shopping window |
//! | - | Unknown | nothing matched |

use std::ops::RangeInclusive;

use crate::{Category, PlaceConfig, TemporalPattern};

/// 22:00-23:59 and 00:00-06:59
const NIGHT_HOURS: [RangeInclusive<usize>; 2] = [22..=23, 0..=6];
const WORK_HOURS: [RangeInclusive<usize>; 1] = [9..=17];
/// 06:00-09:59 and 17:00-20:59
const GYM_HOURS: [RangeInclusive<usize>; 2] = [6..=9, 17..=20];
/// 11:00-14:59 and 18:00-21:59
const MEAL_HOURS: [RangeInclusive<usize>; 2] = [11..=14, 18..=21];

type RulePredicate = fn(&TemporalPattern, &PlaceConfig) -> bool;

struct CategoryRule {
    category: Category,
    matches: RulePredicate,
}

const CATEGORY_RULES: [CategoryRule; 5] = [
    CategoryRule {
        category: Category::Home,
        matches: is_home,
    },
    CategoryRule {
        category: Category::Work,
        matches: is_work,
    },
    CategoryRule {
        category: Category::Gym,
        matches: is_gym,
    },
    CategoryRule {
        category: Category::Restaurant,
        matches: is_restaurant,
    },
    CategoryRule {
        category: Category::Shopping,
        matches: is_shopping,
    },
];

/// Assign a category to a pattern. Falls through to `Unknown`.
pub fn categorize(pattern: &TemporalPattern, config: &PlaceConfig) -> Category {
    CATEGORY_RULES
        .iter()
        .find(|rule| (rule.matches)(pattern, config))
        .map(|rule| rule.category)
        .unwrap_or(Category::Unknown)
}

/// Every category whose rule matches, in rule order.
///
/// The first entry (if any) is what [`categorize`] returns; the rest show
/// which runner-up categories the pattern also satisfied.
pub fn matching_categories(pattern: &TemporalPattern, config: &PlaceConfig) -> Vec<Category> {
    CATEGORY_RULES
        .iter()
        .filter(|rule| (rule.matches)(pattern, config))
        .map(|rule| rule.category)
        .collect()
}

fn is_home(pattern: &TemporalPattern, config: &PlaceConfig) -> bool {
    pattern.hour_ratio(&NIGHT_HOURS) >= config.home_night_ratio
        && pattern.avg_dwell_hours() >= config.home_min_dwell_hours
        && f64::from(pattern.visits_per_week) >= config.home_min_visits_per_week
}

fn is_work(pattern: &TemporalPattern, config: &PlaceConfig) -> bool {
    pattern.hour_ratio(&WORK_HOURS) >= config.work_hours_ratio
        && pattern.weekday_fraction() >= config.work_min_weekday_fraction
        && pattern.avg_dwell_hours() >= config.work_min_dwell_hours
}

fn is_gym(pattern: &TemporalPattern, config: &PlaceConfig) -> bool {
    let dwell = pattern.avg_dwell_minutes();
    pattern.hour_ratio(&GYM_HOURS) >= config.gym_activity_threshold
        && dwell >= config.gym_min_dwell_minutes
        && dwell <= config.gym_max_dwell_minutes
        && f64::from(pattern.visits_per_week) >= config.gym_min_visits_per_week
}

fn is_restaurant(pattern: &TemporalPattern, config: &PlaceConfig) -> bool {
    let dwell = pattern.avg_dwell_minutes();
    pattern.hour_ratio(&MEAL_HOURS) >= config.restaurant_meal_threshold
        && dwell >= config.restaurant_min_minutes
        && dwell <= config.restaurant_max_minutes
}

fn is_shopping(pattern: &TemporalPattern, config: &PlaceConfig) -> bool {
    let dwell = pattern.avg_dwell_minutes();
    dwell >= config.shopping_min_minutes && dwell <= config.shopping_max_minutes
}
