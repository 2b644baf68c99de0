use crate::errors::PipelineError;
use crate::models::Example;

/// Tables the bundled corpus is written against.
pub const T_SHIRT_SCHEMA: &str = "\
1. `t_shirts` with columns - brand, color, size, price, stock_quantity
2. `discounts` with columns - discount_id, t_shirt_id, pct_discount";

const T_SHIRT_EXAMPLES: &[(&str, &str)] = &[
    (
        "What is total revenue if all t-shirts of size M are sold at full price without discounts?",
        "SELECT SUM(price * stock_quantity) FROM t_shirts WHERE size='M';",
    ),
    (
        "How many total t-shirts are left in stock?",
        "SELECT SUM(stock_quantity) FROM t_shirts;",
    ),
    (
        "How many entries of records are present?",
        "SELECT COUNT(*) FROM t_shirts;",
    ),
    (
        "Tell me all the Nike t-shirts?",
        "SELECT * FROM t_shirts WHERE brand='Nike';",
    ),
    (
        "What is the average price of all t-shirts?",
        "SELECT AVG(price) FROM t_shirts;",
    ),
    (
        "Show me the t-shirts available in color red.",
        "SELECT * FROM t_shirts WHERE color='Red';",
    ),
    (
        "How many t-shirts do we have left for Nike in XS size and white color?",
        "SELECT sum(stock_quantity) FROM t_shirts WHERE brand = 'Nike' AND color = 'White' AND size = 'XS'",
    ),
    (
        "How much is the total price of the inventory for all S-size t-shirts?",
        "SELECT SUM(price*stock_quantity) FROM t_shirts WHERE size = 'S'",
    ),
    (
        "Show me tshirt ids and their stock quantities.",
        "SELECT tshirt_id, stock_quantity FROM t_shirts;",
    ),
    (
        "What is the highest discount percentage given?",
        "SELECT MAX(pct_discount) FROM discounts;",
    ),
    (
        "List all t-shirt IDs with a discount greater than 30 percent.",
        "SELECT t_shirt_id FROM discounts WHERE pct_discount > 30;",
    ),
    (
        "What is the average discount percentage?",
        "SELECT AVG(pct_discount) FROM discounts;",
    ),
    (
        "Get all records from the discount table.",
        "SELECT * FROM discounts;",
    ),
];

/// Immutable question/SQL pairs. An example's position is its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleCorpus {
    examples: Vec<Example>,
}

impl ExampleCorpus {
    pub fn new(examples: Vec<Example>) -> Result<Self, PipelineError> {
        if examples.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }
        Ok(Self { examples })
    }

    /// The t-shirt store corpus shipped with the binary.
    pub fn t_shirt_store() -> Self {
        Self {
            examples: T_SHIRT_EXAMPLES
                .iter()
                .map(|(question, sql)| Example::new(*question, *sql))
                .collect(),
        }
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn get(&self, position: usize) -> Option<&Example> {
        self.examples.get(position)
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.examples.iter().map(|e| e.question.as_str())
    }
}
