//! Static coding challenge library for the practice dojo.

use serde::Serialize;

use prepai_types::{InterviewError, InterviewResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodingChallenge {
    pub id: &'static str,
    pub title: &'static str,
    pub difficulty: &'static str,
    pub description: &'static str,
    pub constraints: &'static [&'static str],
    pub starter_code: &'static str,
    pub sample_input: &'static str,
    pub sample_output: &'static str,
}

const CHALLENGES: &[CodingChallenge] = &[
    CodingChallenge {
        id: "ml_1",
        title: "Linear Regression from Scratch",
        difficulty: "Medium",
        description: "Implement a simple Linear Regression model using only NumPy. \
                      Implement fit() with gradient descent and predict().",
        constraints: &["Time complexity: O(epochs * n_samples)", "Memory: < 256MB"],
        starter_code: "import numpy as np\n\n\
                       class LinearRegression:\n    \
                       def __init__(self, lr=0.01, epochs=1000):\n        \
                       self.lr = lr\n        \
                       self.epochs = epochs\n        \
                       self.weights = None\n        \
                       self.bias = None\n\n    \
                       def fit(self, X, y):\n        \
                       pass\n\n    \
                       def predict(self, X):\n        \
                       pass",
        sample_input: "X = [[1], [2], [3]], y = [2, 4, 6]",
        sample_output: "Predictions: [2, 4, 6]",
    },
    CodingChallenge {
        id: "ds_1",
        title: "K-Nearest Neighbors Logic",
        difficulty: "Easy",
        description: "Calculate the Euclidean distance between a query point and a list of \
                      dataset points, returning the indices of the K nearest neighbors.",
        constraints: &["Use standard math libraries", "K will always be < len(points)"],
        starter_code: "import math\n\n\
                       def get_knn(query, points, k):\n    \
                       return []",
        sample_input: "query=[0,0], points=[[1,1],[0.1,0.1],[2,2]], k=1",
        sample_output: "[1]",
    },
];

/// Every challenge, in listing order.
pub fn coding_challenges() -> &'static [CodingChallenge] {
    CHALLENGES
}

pub fn coding_challenge(id: &str) -> InterviewResult<&'static CodingChallenge> {
    let id = id.trim();
    CHALLENGES
        .iter()
        .find(|challenge| challenge.id == id)
        .ok_or_else(|| InterviewError::NotFound(format!("challenge {id} does not exist")))
}
