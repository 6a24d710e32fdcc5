//! Quiz catalog and sampling
//!
//! The catalog is static; a run draws its questions by shuffling a copy and
//! taking the first `count`. The RNG is injected so draws are reproducible.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

/// Number of answer options every question carries
pub const OPTION_COUNT: usize = 4;

/// Subject tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Subject {
    Math,
    Science,
    History,
    Geography,
    Literature,
}

/// Difficulty tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A multiple-choice quiz item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: &'static str,
    pub subject: Subject,
    pub difficulty: Difficulty,
    #[serde(rename = "question")]
    pub prompt: &'static str,
    pub options: [&'static str; OPTION_COUNT],
    #[serde(rename = "correctAnswer")]
    pub correct_option: usize,
    pub explanation: &'static str,
}

impl Question {
    /// Whether `option` is the correct answer. Out-of-range options are wrong.
    #[inline]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }

    pub fn correct_text(&self) -> &'static str {
        self.options[self.correct_option]
    }
}

/// The question provider
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The built-in Class 6-8 mathematics catalog
    pub fn standard() -> Self {
        Self::new(CATALOG.to_vec())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Uniform draw of up to `count` questions without replacement
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<Question> {
        let mut pool = self.questions.clone();
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }

    /// Uniform draw of up to `count` questions of one difficulty
    pub fn sample_by_difficulty<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<Question> {
        let mut pool: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .copied()
            .collect();
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::standard()
    }
}

const fn math(
    id: &'static str,
    difficulty: Difficulty,
    prompt: &'static str,
    options: [&'static str; OPTION_COUNT],
    explanation: &'static str,
) -> Question {
    Question {
        id,
        subject: Subject::Math,
        difficulty,
        prompt,
        options,
        correct_option: 0,
        explanation,
    }
}

static CATALOG: [Question; 16] = [
    // Class 6 - Fractions
    math(
        "math_6_frac_001",
        Difficulty::Easy,
        "What is 3/4 + 1/4?",
        ["1", "4/8", "4/4", "1/2"],
        "3/4 + 1/4 = (3+1)/4 = 4/4 = 1. When adding fractions with the same denominator, add the numerators and keep the denominator same.",
    ),
    math(
        "math_6_frac_002",
        Difficulty::Easy,
        "Which fraction is equivalent to 2/6?",
        ["1/3", "2/3", "4/6", "3/9"],
        "2/6 = 1/3 when simplified by dividing both numerator and denominator by their GCD, which is 2.",
    ),
    // Class 6 - Decimals
    math(
        "math_6_dec_001",
        Difficulty::Easy,
        "What is 0.5 + 0.3?",
        ["0.8", "0.53", "8", "5.3"],
        "0.5 + 0.3 = 0.8. When adding decimals, align the decimal points and add normally.",
    ),
    math(
        "math_6_dec_002",
        Difficulty::Medium,
        "Convert 3/5 to decimal form.",
        ["0.6", "0.35", "0.53", "0.65"],
        "3/5 = 3 ÷ 5 = 0.6. To convert a fraction to decimal, divide the numerator by the denominator.",
    ),
    // Class 7 - Algebra
    math(
        "math_7_alg_001",
        Difficulty::Medium,
        "If x = 5, what is the value of 3x + 2?",
        ["17", "15", "13", "10"],
        "3x + 2 = 3(5) + 2 = 15 + 2 = 17. Substitute the value of x and perform the operations.",
    ),
    math(
        "math_7_alg_002",
        Difficulty::Medium,
        "Simplify: 5a + 3a - 2a",
        ["6a", "10a", "8a", "3a"],
        "5a + 3a - 2a = (5 + 3 - 2)a = 6a. Combine like terms by adding/subtracting their coefficients.",
    ),
    // Class 7 - Geometry
    math(
        "math_7_geo_001",
        Difficulty::Medium,
        "What is the sum of angles in a triangle?",
        ["180°", "360°", "90°", "270°"],
        "The sum of all interior angles in any triangle is always 180°. This is a fundamental property of triangles.",
    ),
    math(
        "math_7_geo_002",
        Difficulty::Medium,
        "If two angles of a triangle are 60° and 70°, what is the third angle?",
        ["50°", "60°", "40°", "30°"],
        "Third angle = 180° - (60° + 70°) = 180° - 130° = 50°. The sum of all angles in a triangle is 180°.",
    ),
    // Class 8 - Mensuration
    math(
        "math_8_men_001",
        Difficulty::Hard,
        "Find the area of a rectangle with length 8 cm and breadth 5 cm.",
        ["40 cm²", "26 cm²", "13 cm²", "45 cm²"],
        "Area of rectangle = length × breadth = 8 × 5 = 40 cm². The area is measured in square units.",
    ),
    math(
        "math_8_men_002",
        Difficulty::Hard,
        "What is the perimeter of a square with side 6 cm?",
        ["24 cm", "36 cm", "12 cm", "18 cm"],
        "Perimeter of square = 4 × side = 4 × 6 = 24 cm. Perimeter is the total length of all sides.",
    ),
    // Class 8 - Data handling
    math(
        "math_8_data_001",
        Difficulty::Medium,
        "Find the mean of: 10, 15, 20, 25, 30",
        ["20", "25", "15", "30"],
        "Mean = (10 + 15 + 20 + 25 + 30) ÷ 5 = 100 ÷ 5 = 20. Mean is the sum of all values divided by the number of values.",
    ),
    math(
        "math_8_data_002",
        Difficulty::Medium,
        "What is the median of: 3, 7, 9, 12, 15?",
        ["9", "7", "12", "10"],
        "Median is the middle value when data is arranged in order. Here, 9 is the middle value (3rd position out of 5 values).",
    ),
    // Class 6 - Basic operations
    math(
        "math_6_basic_001",
        Difficulty::Easy,
        "What is 144 ÷ 12?",
        ["12", "10", "14", "16"],
        "144 ÷ 12 = 12. You can verify: 12 × 12 = 144.",
    ),
    math(
        "math_6_basic_002",
        Difficulty::Easy,
        "Find the LCM of 4 and 6.",
        ["12", "24", "8", "10"],
        "LCM of 4 and 6: Multiples of 4: 4, 8, 12, 16... Multiples of 6: 6, 12, 18... The smallest common multiple is 12.",
    ),
    // Class 7 - Integers
    math(
        "math_7_int_001",
        Difficulty::Medium,
        "What is (-5) + (+3)?",
        ["-2", "+2", "-8", "+8"],
        "(-5) + (+3) = -5 + 3 = -2. When adding integers with different signs, subtract and take the sign of the larger absolute value.",
    ),
    math(
        "math_7_int_002",
        Difficulty::Medium,
        "What is (-4) × (-6)?",
        ["+24", "-24", "+10", "-10"],
        "(-4) × (-6) = +24. When multiplying two negative integers, the result is positive.",
    ),
];
