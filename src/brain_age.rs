//! Brain-age classification from final score and average reaction time.
//!
//! The bracket table is evaluated top to bottom and the first matching rule
//! wins. Ranges overlap between rules on purpose; only declaration order
//! decides. The last rule matches everything.

use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrainAge {
    pub age: u32,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    All,
    Any,
}

#[derive(Debug, Clone)]
struct Rule {
    score: RangeInclusive<i64>,
    latency: RangeInclusive<f64>,
    join: Join,
    bracket: BrainAge,
}

impl Rule {
    fn matches(&self, score: i64, latency: f64) -> bool {
        let s = self.score.contains(&score);
        let l = self.latency.contains(&latency);
        match self.join {
            Join::All => s && l,
            Join::Any => s || l,
        }
    }
}

const AGE_20: BrainAge = BrainAge {
    age: 20,
    message: "Congratulations! Your brain age is only 20! Your reactions rival a pro gamer's and you barely slipped on a single call. Your brain is in its prime.",
};
const AGE_35: BrainAge = BrainAge {
    age: 35,
    message: "Nice work! Your brain age is 35. Steady reactions and solid judgment; a little slow now and then, but well ahead of your peers.",
};
const AGE_55: BrainAge = BrainAge {
    age: 55,
    message: "Your brain age is 55. A bit slower, but you make few mistakes. A steady decision maker who puts accuracy ahead of speed.",
};
const AGE_65: BrainAge = BrainAge {
    age: 65,
    message: "Your brain age is 65. Reactions are on the slow side and a few calls went wrong. Stay focused next time and you may shave off some years!",
};
const AGE_80: BrainAge = BrainAge {
    age: 80,
    message: "Your brain age is 80. Slow reactions and quite a few mistakes, but no worries! Play a few more rounds and you might even reverse the clock.",
};

pub const OLDEST: BrainAge = AGE_80;

fn rules() -> [Rule; 6] {
    [
        Rule {
            score: 16..=i64::MAX,
            latency: f64::NEG_INFINITY..=0.45,
            join: Join::All,
            bracket: AGE_20,
        },
        Rule {
            score: 10..=15,
            latency: 0.40..=0.55,
            join: Join::Any,
            bracket: AGE_35,
        },
        Rule {
            score: 1..=11,
            latency: 0.50..=0.75,
            join: Join::All,
            bracket: AGE_55,
        },
        Rule {
            score: -5..=2,
            latency: 0.70..=0.85,
            join: Join::All,
            bracket: AGE_65,
        },
        Rule {
            score: -6..=-5,
            latency: 0.70..=0.85,
            join: Join::All,
            bracket: AGE_65,
        },
        Rule {
            score: i64::MIN..=i64::MAX,
            latency: f64::NEG_INFINITY..=f64::INFINITY,
            join: Join::Any,
            bracket: AGE_80,
        },
    ]
}

/// Total over every score and every average latency, including NaN (which
/// only the catch-all accepts). No latency at all means the oldest bracket.
pub fn classify(score: i64, avg_latency: Option<f64>) -> BrainAge {
    let Some(latency) = avg_latency else {
        return OLDEST;
    };
    rules()
        .into_iter()
        .find(|rule| rule.matches(score, latency))
        .map(|rule| rule.bracket)
        .unwrap_or(OLDEST)
}
