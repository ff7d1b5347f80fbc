//! crates/finance_assistant_core/src/taxonomy.rs
//!
//! The knowledge taxonomy and the classifier that maps a free-text user
//! utterance onto a canned response.
//!
//! The taxonomy is a declarative table rather than branching code: an
//! ordered list of domain rules, each with a trigger set, an ordered list of
//! topic rules, and a declared default topic. Greetings are a list of
//! alternatives picked at random; one flat fallback response covers text
//! that activates nothing. Domain priority and topic order are properties
//! of the data, so an utterance matching triggers in two domains resolves
//! to whichever domain sits earlier in the table.
//!
//! Matching is substring containment on the lower-cased utterance, not
//! tokenized word matching. A trigger can match mid-word ("goaled" matches
//! the trigger "goal"); that is accepted behavior, kept rather than
//! silently switched to word-boundary matching.

use crate::ports::RandomSource;

/// A keyed sub-rule within a domain: the first topic whose trigger occurs
/// in the utterance supplies the response.
#[derive(Debug, Clone)]
pub struct TopicRule {
    pub key: &'static str,
    pub triggers: &'static [&'static str],
    pub response: &'static str,
}

/// A top-level grouping: activated when any of its triggers occurs in the
/// lower-cased utterance. `default_topic` indexes into `topics` and is used
/// when the domain activates but no topic trigger matches.
#[derive(Debug, Clone)]
pub struct DomainRule {
    pub name: &'static str,
    pub triggers: &'static [&'static str],
    pub topics: &'static [TopicRule],
    pub default_topic: usize,
}

/// The greeting domain: its entries are alternatives, not keyed topics.
#[derive(Debug, Clone)]
pub struct GreetingRule {
    pub triggers: &'static [&'static str],
    pub responses: &'static [&'static str],
}

/// The complete, runtime-immutable knowledge taxonomy.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub greeting: &'static str,
    greetings: GreetingRule,
    domains: &'static [DomainRule],
    fallback: &'static str,
}

/// The message seeding every new conversation.
const OPENING_GREETING: &str = "Hello! I'm your Nexus Finance AI assistant. \
     I can help you with financial advice, transaction categorization, market \
     trends in Zimbabwe, and answer questions about your finances. How can I \
     help you today?";

const GREETINGS: GreetingRule = GreetingRule {
    triggers: &["hello", "hi", "hey"],
    responses: &[
        "Hello! How can I assist with your finances today?",
        "Hi there! Ready to optimize your financial health?",
        "Welcome back! What financial questions can I help with?",
    ],
};

const FALLBACK: &str = "I understand you're asking about financial matters. \
     Could you be more specific? I can help with transactions, accounts, \
     analytics, goals, or Zimbabwe-specific financial questions.";

// Ordered by priority; the first activated domain wins. "add" and "edit"
// are tested before the "how"-triggered topics so that e.g. "how do I add a
// transaction" selects the add topic.
const DOMAINS: &[DomainRule] = &[
    DomainRule {
        name: "transactions",
        triggers: &["categor", "transaction"],
        topics: &[
            TopicRule {
                key: "add transaction",
                triggers: &["add"],
                response: "Go to the Transactions page and click 'Add \
                     Transaction'. I'll automatically suggest the category \
                     based on the description.",
            },
            TopicRule {
                key: "edit category",
                triggers: &["edit"],
                response: "You can edit transaction categories by clicking \
                     on the transaction and selecting a new category from \
                     the dropdown.",
            },
            TopicRule {
                key: "how to categorize",
                triggers: &["how", "work"],
                response: "I use machine learning to automatically \
                     categorize your transactions based on Zimbabwean \
                     vendor patterns. You can also manually adjust \
                     categories if needed.",
            },
        ],
        default_topic: 2,
    },
    DomainRule {
        name: "accounts",
        triggers: &["account", "balance"],
        topics: &[
            TopicRule {
                key: "multi currency",
                triggers: &["currenc", "multi"],
                response: "Nexus Finance supports USD, ZiG, and ZAR. You \
                     can track balances in all currencies and see your \
                     total net worth.",
            },
            TopicRule {
                key: "add account",
                triggers: &["add", "create"],
                response: "Visit the Accounts page and click 'Add Account' \
                     to create new bank, mobile money, or cash accounts.",
            },
            TopicRule {
                key: "balance tracking",
                triggers: &["track"],
                response: "Your balances update automatically when you add \
                     transactions. You can see all account balances on \
                     your dashboard.",
            },
        ],
        default_topic: 2,
    },
    DomainRule {
        name: "zimbabwe",
        triggers: &["zimbab", "inflation", "ecocash"],
        topics: &[
            TopicRule {
                key: "inflation",
                triggers: &["inflation"],
                response: "Zimbabwe's inflation requires careful financial \
                     planning. I adjust cash flow forecasts with \
                     configurable inflation rates to give you realistic \
                     projections.",
            },
            TopicRule {
                key: "ecocash",
                triggers: &["ecocash"],
                response: "I recognize EcoCash transactions automatically \
                     and categorize them appropriately. You can track \
                     mobile money separately from bank accounts.",
            },
            TopicRule {
                key: "exchange rates",
                triggers: &["exchange", "rate"],
                response: "While I don't currently pull live exchange \
                     rates, you can manually adjust currency conversions \
                     in future versions.",
            },
            TopicRule {
                key: "informal sector",
                triggers: &["informal"],
                response: "I track informal sector spending patterns and \
                     provide insights specific to Zimbabwe's economic \
                     context.",
            },
        ],
        default_topic: 0,
    },
    DomainRule {
        name: "analytics",
        triggers: &["analytics", "insight", "spending"],
        topics: &[
            TopicRule {
                key: "spending insights",
                triggers: &["spending", "insight"],
                response: "I analyze your spending patterns across \
                     categories and merchants, showing trends and helping \
                     identify areas for optimization.",
            },
            TopicRule {
                key: "cash flow forecast",
                triggers: &["forecast", "cash flow"],
                response: "My forecasting considers your spending history \
                     and allows you to adjust for expected inflation \
                     rates.",
            },
            TopicRule {
                key: "financial health",
                triggers: &["health", "score"],
                response: "I calculate a comprehensive health score based \
                     on savings rate, emergency fund, spending diversity, \
                     and goal progress.",
            },
        ],
        default_topic: 0,
    },
    DomainRule {
        name: "goals",
        triggers: &["goal", "save", "target"],
        topics: &[
            TopicRule {
                key: "set goals",
                triggers: &["set", "create"],
                response: "You can set financial goals with target \
                     amounts, deadlines, and priorities. I'll track your \
                     progress and suggest ways to stay on target.",
            },
            TopicRule {
                key: "emergency fund",
                triggers: &["emergency", "fund"],
                response: "I recommend building an emergency fund covering \
                     3-6 months of expenses, especially important in \
                     Zimbabwe's volatile economy.",
            },
            TopicRule {
                key: "savings tips",
                triggers: &["tip"],
                response: "Consider setting aside 10-20% of income, \
                     automating savings, and tracking progress toward \
                     specific goals.",
            },
        ],
        default_topic: 2,
    },
    DomainRule {
        name: "market",
        triggers: &["market", "trend", "invest"],
        topics: &[
            TopicRule {
                key: "trends",
                triggers: &["trend"],
                response: "Check the Market Trends page for current \
                     economic indicators and news relevant to Zimbabwe.",
            },
            TopicRule {
                key: "investing",
                triggers: &["invest"],
                response: "In Zimbabwe's context, consider diversified \
                     approaches including formal investments and informal \
                     opportunities.",
            },
            TopicRule {
                key: "currency advice",
                triggers: &["currenc", "advice"],
                response: "Maintaining balances in stable currencies like \
                     USD while having some local currency for daily \
                     expenses is often wise.",
            },
        ],
        default_topic: 0,
    },
    DomainRule {
        name: "help",
        triggers: &["help", "what can you do"],
        topics: &[TopicRule {
            key: "overview",
            triggers: &[],
            response: "I can help you with: • Transaction categorization • \
                 Account management • Spending analytics • Financial goals \
                 • Cash flow forecasting • Zimbabwe-specific financial \
                 advice • Market trends • Financial health scoring • \
                 Inflation-aware planning • Multi-currency tracking",
        }],
        default_topic: 0,
    },
];

impl Taxonomy {
    /// The built-in Nexus Finance knowledge base.
    pub fn finance() -> Self {
        Self {
            greeting: OPENING_GREETING,
            greetings: GREETINGS,
            domains: DOMAINS,
            fallback: FALLBACK,
        }
    }

    pub fn fallback(&self) -> &'static str {
        self.fallback
    }

    pub fn greeting_responses(&self) -> &'static [&'static str] {
        self.greetings.responses
    }

    /// Maps a user utterance onto a response.
    ///
    /// Evaluation order: greetings first, then each domain in table order,
    /// then the fallback. `random` is consulted only when the greeting
    /// domain activates.
    pub fn classify(&self, text: &str, random: &dyn RandomSource) -> String {
        let message = text.to_lowercase();

        if contains_any(&message, self.greetings.triggers) {
            let index = random.pick_index(self.greetings.responses.len());
            return self.greetings.responses[index].to_string();
        }

        for domain in self.domains {
            if !contains_any(&message, domain.triggers) {
                continue;
            }
            let topic = domain
                .topics
                .iter()
                .find(|topic| contains_any(&message, topic.triggers))
                .unwrap_or(&domain.topics[domain.default_topic]);
            return topic.response.to_string();
        }

        self.fallback.to_string()
    }
}

fn contains_any(message: &str, triggers: &[&str]) -> bool {
    triggers.iter().any(|trigger| message.contains(trigger))
}
